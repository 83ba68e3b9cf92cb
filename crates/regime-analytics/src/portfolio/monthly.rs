//! 기간별 수익률과 낙폭 시계열.
//!
//! 월별/연도별 수익률은 기간 말 NAV 대비 직전 기간 말 NAV로 계산하며,
//! 첫 기간은 첫 NAV 값을 기준으로 합니다.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::performance::NavPoint;

/// 월별 수익률 셀
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    /// 연도
    pub year: i32,
    /// 월 (1-12)
    pub month: u32,
    /// 수익률 (비율)
    pub return_rate: f64,
}

/// 연도별 수익률
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyReturn {
    /// 연도
    pub year: i32,
    /// 수익률 (비율)
    pub return_rate: f64,
}

/// 낙폭 시계열의 한 점
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    /// 고점 대비 비율 (0 이하)
    pub drawdown: f64,
}

/// 기간 키가 바뀌는 지점마다 (키, 기간 수익률)을 만듭니다.
fn period_returns<K: PartialEq + Copy>(nav: &[NavPoint], key: impl Fn(NaiveDate) -> K) -> Vec<(K, f64)> {
    let Some(first) = nav.first() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut base = first.value;
    let mut current_key = key(first.date);
    let mut last_value = first.value;

    for point in &nav[1..] {
        let k = key(point.date);
        if k != current_key {
            out.push((current_key, last_value / base - 1.0));
            base = last_value;
            current_key = k;
        }
        last_value = point.value;
    }
    out.push((current_key, last_value / base - 1.0));
    out
}

/// 월별 수익률
pub fn monthly_returns(nav: &[NavPoint]) -> Vec<MonthlyReturn> {
    period_returns(nav, |d| (d.year(), d.month()))
        .into_iter()
        .map(|((year, month), return_rate)| MonthlyReturn {
            year,
            month,
            return_rate,
        })
        .collect()
}

/// 연도별 수익률
pub fn yearly_returns(nav: &[NavPoint]) -> Vec<YearlyReturn> {
    period_returns(nav, |d| d.year())
        .into_iter()
        .map(|(year, return_rate)| YearlyReturn { year, return_rate })
        .collect()
}

/// 날짜별 고점 대비 낙폭
pub fn drawdown_series(nav: &[NavPoint]) -> Vec<DrawdownPoint> {
    let mut peak = f64::MIN;
    nav.iter()
        .map(|point| {
            peak = peak.max(point.value);
            DrawdownPoint {
                date: point.date,
                drawdown: if peak > 0.0 { point.value / peak - 1.0 } else { 0.0 },
            }
        })
        .collect()
}
