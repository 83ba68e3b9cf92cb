//! 레짐 기반 자산배분 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 가격 + 거시 지표 → 피처 테이블
//! regime extract --prices data/prices.csv --macro data/macro.csv -o data/features.csv
//!
//! # 날짜별 레짐 분류 (발동 조건 포함)
//! regime classify --features data/features.csv --explain
//!
//! # 동적 전략과 벤치마크 비교
//! regime backtest --prices data/prices.csv --features data/features.csv --benchmark spy,60-40
//!
//! # 거래 비용 민감도
//! regime sweep --prices data/prices.csv --features data/features.csv --cost-bps 0,5,10,25
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use regime_cli::commands::backtest::{run_backtest, BacktestCliConfig, DEFAULT_BENCHMARKS};
use regime_cli::commands::classify::{run_classify, ClassifyConfig};
use regime_cli::commands::extract::{run_extract, ExtractConfig};
use regime_cli::commands::sweep::{run_cost_sweep, SweepCliConfig};
use regime_cli::commands::parse_date;
use regime_core::{init_logging, AppConfig, LogConfig, RegimeError};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "regime")]
#[command(about = "레짐 기반 자산배분 엔진 - 피처 추출, 레짐 분류, 백테스트", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 가격/거시 지표 CSV에서 피처 테이블 생성
    Extract {
        /// 가격 CSV (date + 종목별 종가)
        #[arg(short, long)]
        prices: PathBuf,

        /// 거시 지표 CSV (date, vix, long_yield, short_yield, unemployment)
        #[arg(short, long = "macro")]
        macro_data: PathBuf,

        /// 출력 피처 CSV
        #[arg(short, long, default_value = "data/features.csv")]
        output: PathBuf,
    },

    /// 피처 테이블의 날짜별 레짐 분류
    Classify {
        /// 피처 CSV
        #[arg(long)]
        features: PathBuf,

        /// 발동 조건 함께 출력
        #[arg(long, default_value = "false")]
        explain: bool,

        /// 결과 CSV 경로 (지정하지 않으면 stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 동적 전략과 고정 비중 벤치마크 백테스트
    Backtest {
        /// 가격 CSV
        #[arg(short, long)]
        prices: PathBuf,

        /// 피처 CSV
        #[arg(long)]
        features: PathBuf,

        /// 시작 날짜 (YYYY-MM-DD)
        #[arg(short = 'f', long, value_parser = parse_date)]
        from: Option<NaiveDate>,

        /// 종료 날짜 (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_date)]
        to: Option<NaiveDate>,

        /// 비교 벤치마크 (spy, qqq, 60-40; 쉼표로 구분)
        #[arg(short, long, value_delimiter = ',')]
        benchmark: Option<Vec<String>>,

        /// 동적 전략 일별 이력 CSV
        #[arg(long)]
        history: Option<PathBuf>,

        /// 결과 저장 경로 (.json이면 JSON, 그 외 텍스트 요약)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 거래 비용별 병렬 백테스트
    Sweep {
        /// 가격 CSV
        #[arg(short, long)]
        prices: PathBuf,

        /// 피처 CSV
        #[arg(long)]
        features: PathBuf,

        /// 시작 날짜 (YYYY-MM-DD)
        #[arg(short = 'f', long, value_parser = parse_date)]
        from: Option<NaiveDate>,

        /// 종료 날짜 (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_date)]
        to: Option<NaiveDate>,

        /// 전략 (dynamic, spy, qqq, 60-40)
        #[arg(short, long, default_value = "dynamic")]
        strategy: String,

        /// 거래 비용 목록 (bp, 쉼표로 구분)
        #[arg(long, value_delimiter = ',', default_value = "0,5,10,25,50")]
        cost_bps: Vec<f64>,
    },
}

/// 설정 파일을 로드합니다. 경로를 지정하지 않았고 기본 파일도 없으면 기본값을 사용합니다.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::load(path)?),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Ok(AppConfig::load_default()?),
        None => Ok(AppConfig::default()),
    }
}

async fn run(cli: Cli, app: AppConfig) -> Result<()> {
    let engine = app.engine;

    match cli.command {
        Commands::Extract {
            prices,
            macro_data,
            output,
        } => {
            let config = ExtractConfig {
                prices_path: prices,
                macro_path: macro_data,
                output_path: output.clone(),
            };
            let rows = run_extract(&engine, &config)?;
            println!("\n피처 추출 완료: {} 행", rows);
            println!("저장 위치: {}", output.display());
        }

        Commands::Classify {
            features,
            explain,
            output,
        } => {
            let config = ClassifyConfig {
                features_path: features,
                explain,
                output_path: output,
            };
            let results = run_classify(&engine, &config)?;
            info!(days = results.len(), "classification finished");
        }

        Commands::Backtest {
            prices,
            features,
            from,
            to,
            benchmark,
            history,
            output,
        } => {
            if let (Some(from), Some(to)) = (from, to) {
                if from > to {
                    return Err(anyhow!("시작일이 종료일보다 늦습니다: {} > {}", from, to));
                }
            }

            let config = BacktestCliConfig {
                prices_path: prices,
                features_path: features,
                start_date: from,
                end_date: to,
                benchmarks: benchmark.unwrap_or_else(|| {
                    DEFAULT_BENCHMARKS.iter().map(|s| s.to_string()).collect()
                }),
                history_path: history,
                output_path: output,
            };
            let reports = run_backtest(engine, config).await?;
            info!(strategies = reports.len(), "backtest finished");
        }

        Commands::Sweep {
            prices,
            features,
            from,
            to,
            strategy,
            cost_bps,
        } => {
            if cost_bps.is_empty() {
                return Err(anyhow!("거래 비용 목록이 비어 있습니다"));
            }
            let config = SweepCliConfig {
                prices_path: prices,
                features_path: features,
                start_date: from,
                end_date: to,
                strategy,
                costs_bps: cost_bps,
            };
            run_cost_sweep(engine, config).await?;
        }
    }

    Ok(())
}

/// 입력 검증 실패는 2, 그 외 실패는 1
fn exit_code(err: &anyhow::Error) -> ExitCode {
    let validation = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<RegimeError>())
        .any(RegimeError::is_validation);
    if validation {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let app = match load_config(cli.config.as_deref()) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("설정 로드 실패: {:#}", e);
            return exit_code(&e);
        }
    };

    if let Err(e) = init_logging(LogConfig::from(&app.logging)) {
        eprintln!("로깅 초기화 실패: {}", e);
    }
    if cli.config.is_none() && !Path::new(DEFAULT_CONFIG_PATH).exists() {
        warn!("no config file found, using defaults");
    }

    match run(cli, app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("command failed: {:#}", e);
            eprintln!("\n오류: {:#}", e);
            exit_code(&e)
        }
    }
}
