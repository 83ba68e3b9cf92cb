//! 도메인 모델.

pub mod asset;
pub mod feature;
pub mod price;
pub mod regime;
pub mod weights;

pub use asset::{Asset, AssetMap, RiskCategory, ASSET_COUNT};
pub use feature::{FeatureRow, FeatureTable, RawFeatureRow};
pub use price::PriceTable;
pub use regime::{Regime, REGIME_COUNT};
pub use weights::{WeightMap, WEIGHT_EPSILON};

use chrono::NaiveDate;

use crate::error::{RegimeError, RegimeResult};

/// 날짜열이 엄격히 증가하는지 검사합니다.
pub fn ensure_increasing(dates: impl IntoIterator<Item = NaiveDate>) -> RegimeResult<()> {
    let mut previous: Option<NaiveDate> = None;
    for (index, current) in dates.into_iter().enumerate() {
        if let Some(prev) = previous {
            if current <= prev {
                return Err(RegimeError::NonMonotonicDates {
                    index,
                    previous: prev,
                    current,
                });
            }
        }
        previous = Some(current);
    }
    Ok(())
}
