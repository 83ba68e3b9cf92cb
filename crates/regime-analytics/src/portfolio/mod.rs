//! 포트폴리오 분석 모듈
//!
//! NAV 시계열을 기간별로 집계합니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use regime_analytics::portfolio::{monthly_returns, drawdown_series};
//!
//! for cell in monthly_returns(&report.nav) {
//!     println!("{}-{:02}: {:.2}%", cell.year, cell.month, cell.return_rate * 100.0);
//! }
//! ```

pub mod monthly;

pub use monthly::*;
