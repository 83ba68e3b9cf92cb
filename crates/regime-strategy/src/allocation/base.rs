//! 레짐별 기본 배분 테이블.

use regime_core::{Asset, Regime, WeightMap};

/// 극단적 공포 레짐의 VIX 구간 (상한, 성장 비중, 헤지 비중).
///
/// VIX가 높을수록 대표 성장 자산 비중을 늘리고 헤지를 줄입니다.
/// 마지막 구간은 상한이 없습니다.
pub const ACCUMULATION_TIERS: [(f64, f64, f64); 4] = [
    (35.0, 0.45, 0.25),
    (45.0, 0.50, 0.20),
    (60.0, 0.55, 0.15),
    (f64::INFINITY, 0.60, 0.10),
];

/// VIX 수준에 해당하는 극단적 공포 구간 (성장, 헤지) 비중.
pub fn accumulation_tier(vix: f64) -> (f64, f64) {
    ACCUMULATION_TIERS
        .iter()
        .find(|(ceiling, _, _)| vix <= *ceiling)
        .map(|&(_, growth, hedge)| (growth, hedge))
        .unwrap_or((ACCUMULATION_TIERS[3].1, ACCUMULATION_TIERS[3].2))
}

/// 레짐 기본 비중. 모든 테이블의 합계는 1.0입니다.
pub fn base_weights(regime: Regime, vix: f64) -> WeightMap {
    use Asset::*;

    match regime {
        Regime::InflationShock => WeightMap::from_pairs(&[
            (Iwy, 0.10),
            (Vtv, 0.15),
            (Ief, 0.05),
            (Gld, 0.25),
            (Dbc, 0.20),
            (Wtmf, 0.20),
            (Vnq, 0.05),
        ]),
        Regime::DeflationRecession => WeightMap::from_pairs(&[
            (Iwy, 0.10),
            (Vtv, 0.05),
            (Tlt, 0.40),
            (Ief, 0.15),
            (Gld, 0.15),
            (Wtmf, 0.15),
        ]),
        Regime::ExtremeAccumulation => {
            let (growth, hedge) = accumulation_tier(vix);
            WeightMap::from_pairs(&[
                (Iwy, growth),
                (Wtmf, hedge),
                (Qqq, 0.10),
                (Tlt, 0.10),
                (Gld, 0.10),
            ])
        }
        Regime::CautiousTrend => WeightMap::from_pairs(&[
            (Iwy, 0.10),
            (Spy, 0.10),
            (Vtv, 0.10),
            (Tlt, 0.15),
            (Ief, 0.20),
            (Gld, 0.15),
            (Wtmf, 0.20),
        ]),
        Regime::CautiousVolatility => WeightMap::from_pairs(&[
            (Iwy, 0.20),
            (Qqq, 0.05),
            (Spy, 0.10),
            (Vtv, 0.10),
            (Tlt, 0.15),
            (Ief, 0.10),
            (Gld, 0.10),
            (Wtmf, 0.15),
            (Vnq, 0.05),
        ]),
        Regime::Neutral => WeightMap::from_pairs(&[
            (Iwy, 0.30),
            (Qqq, 0.10),
            (Spy, 0.10),
            (Vtv, 0.10),
            (Tlt, 0.10),
            (Ief, 0.05),
            (Gld, 0.10),
            (Dbc, 0.05),
            (Wtmf, 0.05),
            (Vnq, 0.05),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_is_fully_invested() {
        for regime in Regime::ALL {
            for vix in [12.0, 33.0, 40.0, 50.0, 90.0] {
                let total = base_weights(regime, vix).total();
                assert!((total - 1.0).abs() < 1e-9, "{} vix={} total={}", regime, vix, total);
            }
        }
    }

    #[test]
    fn test_accumulation_tiers_shift_toward_growth() {
        let calm = base_weights(Regime::ExtremeAccumulation, 31.0);
        let extreme = base_weights(Regime::ExtremeAccumulation, 70.0);
        assert_eq!(calm[Asset::Iwy], 0.45);
        assert_eq!(extreme[Asset::Iwy], 0.60);
        assert!(extreme[Asset::Wtmf] < calm[Asset::Wtmf]);
    }

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        assert_eq!(accumulation_tier(35.0), (0.45, 0.25));
        assert_eq!(accumulation_tier(35.01), (0.50, 0.20));
        assert_eq!(accumulation_tier(60.0), (0.55, 0.15));
    }
}
