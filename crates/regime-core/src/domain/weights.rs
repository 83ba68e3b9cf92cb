//! 목표 비중 맵.
//!
//! 비중 합계는 1.0 이하이며 나머지는 암묵적 현금입니다.
//! 맵은 스스로 정규화하지 않습니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

use super::asset::{Asset, AssetMap};

/// 비중 합계 허용 오차
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// 종목별 목표 비중.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap(AssetMap<f64>);

impl WeightMap {
    /// 전부 현금인 빈 맵
    pub fn empty() -> Self {
        Self(AssetMap::filled(0.0))
    }

    /// (종목, 비중) 목록으로 생성합니다. 중복 종목은 합산됩니다.
    pub fn from_pairs(pairs: &[(Asset, f64)]) -> Self {
        let mut map = Self::empty();
        for &(asset, weight) in pairs {
            map.0[asset] += weight;
        }
        map
    }

    /// 비중 합계
    pub fn total(&self) -> f64 {
        self.0.values().iter().sum()
    }

    /// 암묵적 현금 비중 (1 - 합계)
    pub fn cash(&self) -> f64 {
        1.0 - self.total()
    }

    /// 비중이 0보다 큰 종목인지 확인합니다.
    pub fn holds(&self, asset: Asset) -> bool {
        self.0[asset] > 0.0
    }

    /// 비중이 있는 종목 순회
    pub fn held(&self) -> impl Iterator<Item = (Asset, f64)> + '_ {
        self.0.iter().filter(|(_, w)| **w > 0.0).map(|(a, w)| (a, *w))
    }

    /// 전체 순회
    pub fn iter(&self) -> impl Iterator<Item = (Asset, f64)> + '_ {
        self.0.iter().map(|(a, w)| (a, *w))
    }

    /// `from`에서 `to`로 `amount`만큼 비중을 옮깁니다.
    ///
    /// 이동량은 `[0, from 비중]`으로 잘리므로 합계는 유지되고 음수 비중은
    /// 생기지 않습니다. 실제 이동량을 반환합니다.
    pub fn shift(&mut self, from: Asset, to: Asset, amount: f64) -> f64 {
        if from == to || !amount.is_finite() {
            return 0.0;
        }
        let moved = amount.clamp(0.0, self.0[from]);
        self.0[from] -= moved;
        self.0[to] += moved;
        moved
    }

    /// `from` 비중의 `fraction` 비율을 `to`로 옮깁니다.
    pub fn shift_fraction(&mut self, from: Asset, to: Asset, fraction: f64) -> f64 {
        let amount = self.0[from] * fraction.clamp(0.0, 1.0);
        self.shift(from, to, amount)
    }

    /// 한 종목 비중에 배수를 곱합니다. 줄어든 만큼은 현금이 됩니다.
    pub fn scale(&mut self, asset: Asset, factor: f64) {
        self.0[asset] = (self.0[asset] * factor.max(0.0)).max(0.0);
    }

    /// 모든 비중에 배수를 곱합니다.
    pub fn scale_all(&mut self, factor: f64) {
        for asset in Asset::ALL {
            self.scale(asset, factor);
        }
    }

    /// `origin`에서 `target`으로 진행률 `progress`만큼 선형 보간합니다.
    pub fn blend(origin: &WeightMap, target: &WeightMap, progress: f64) -> WeightMap {
        let p = progress.clamp(0.0, 1.0);
        WeightMap(AssetMap::from_fn(|asset| {
            origin.0[asset] * (1.0 - p) + target.0[asset] * p
        }))
    }

    /// 종목별 비중 차이 절대값의 최대값
    pub fn max_abs_diff(&self, other: &WeightMap) -> f64 {
        Asset::ALL
            .iter()
            .map(|&a| (self.0[a] - other.0[a]).abs())
            .fold(0.0, f64::max)
    }

    /// 현금 레그를 포함한 편도 회전율: ½(Σ|Δw| + |Δcash|)
    pub fn turnover_from(&self, previous: &WeightMap) -> f64 {
        let legs: f64 = Asset::ALL
            .iter()
            .map(|&a| (self.0[a] - previous.0[a]).abs())
            .sum();
        0.5 * (legs + (self.cash() - previous.cash()).abs())
    }

    /// 합계를 1로 정규화한 복사본 (합계가 0이면 `None`)
    pub fn normalized(&self) -> Option<WeightMap> {
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        Some(WeightMap(self.0.map(|_, w| w / total)))
    }

    /// 모든 비중이 유한한 비음수이고 합계가 1 이하인지 확인합니다.
    pub fn is_valid(&self) -> bool {
        self.0.values().iter().all(|w| w.is_finite() && *w >= 0.0)
            && self.total() <= 1.0 + WEIGHT_EPSILON
    }

    /// 내부 슬롯 맵
    pub fn as_map(&self) -> &AssetMap<f64> {
        &self.0
    }
}

impl Index<Asset> for WeightMap {
    type Output = f64;

    fn index(&self, asset: Asset) -> &f64 {
        &self.0[asset]
    }
}

impl IndexMut<Asset> for WeightMap {
    fn index_mut(&mut self, asset: Asset) -> &mut f64 {
        &mut self.0[asset]
    }
}

impl fmt::Display for WeightMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .held()
            .map(|(asset, w)| format!("{} {:.1}%", asset, w * 100.0))
            .collect();
        write!(f, "[{}] 현금 {:.1}%", parts.join(", "), self.cash() * 100.0)
    }
}
