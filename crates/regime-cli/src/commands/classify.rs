//! 레짐 분류 명령어.
//!
//! ```bash
//! # 날짜별 레짐
//! regime classify --features data/features.csv
//!
//! # 발동 조건 포함
//! regime classify --features data/features.csv --explain
//! ```

use std::path::PathBuf;

use anyhow::Result;

use regime_core::{EngineConfig, Regime, REGIME_COUNT};
use regime_strategy::{Classification, RegimeClassifier};

use crate::csv_io;

/// 분류 명령 설정
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    pub features_path: PathBuf,
    /// 발동 조건 출력
    pub explain: bool,
    /// CSV 저장 경로 (없으면 표준 출력)
    pub output_path: Option<PathBuf>,
}

/// 피처 테이블 전체를 분류합니다.
pub fn run_classify(engine: &EngineConfig, config: &ClassifyConfig) -> Result<Vec<Classification>> {
    let table = csv_io::read_features(csv_io::open(&config.features_path)?)?;
    let classifier = RegimeClassifier::new(engine.classifier.clone());
    let results: Vec<Classification> = table.rows().iter().map(|row| classifier.explain(row)).collect();

    match &config.output_path {
        Some(path) => csv_io::write_classifications(csv_io::create(path)?, &results)?,
        None => print_classifications(&results, config.explain),
    }
    println!("\n{}", distribution(&results));

    Ok(results)
}

fn print_classifications(results: &[Classification], explain: bool) {
    for c in results {
        if explain && !c.triggers.is_empty() {
            let reasons: Vec<&str> = c.triggers.iter().map(|t| t.description()).collect();
            println!("{}  {:<22} {}", c.date, c.regime.label(), reasons.join(", "));
        } else {
            println!("{}  {}", c.date, c.regime.label());
        }
    }
}

/// 레짐별 일수 요약
fn distribution(results: &[Classification]) -> String {
    let mut counts = [0usize; REGIME_COUNT];
    for c in results {
        counts[c.regime.index()] += 1;
    }
    let total = results.len().max(1) as f64;

    let mut lines = vec![
        "레짐 분포".to_string(),
        "───────────────────────────────────────".to_string(),
    ];
    for regime in Regime::ALL {
        let days = counts[regime.index()];
        lines.push(format!(
            "{:<22} {:>6} 일 ({:>5.1}%)",
            regime.label(),
            days,
            days as f64 / total * 100.0
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_distribution_counts_each_regime() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let results = vec![
            Classification {
                date,
                regime: Regime::Neutral,
                triggers: vec![],
            },
            Classification {
                date,
                regime: Regime::Neutral,
                triggers: vec![],
            },
            Classification {
                date,
                regime: Regime::CautiousTrend,
                triggers: vec![],
            },
        ];
        let text = distribution(&results);
        assert!(text.contains("NEUTRAL"));
        assert!(text.lines().any(|l| l.starts_with("NEUTRAL") && l.contains(" 2 일")));
        assert!(text.lines().any(|l| l.starts_with("CAUTIOUS_TREND") && l.contains("33.3%")));
    }
}
