mod body;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drainer_core::{BatchQueue, DrainerConfig, RetryingExecutor};

use crate::body::{BodyCompositionExecutor, Measurement};

/// サンプルの計測値をバッチキューに流して結果を表示する
#[derive(Debug, Parser)]
#[command(name = "drainer", version)]
struct Cli {
    /// JSON 設定ファイル（`batch` / `retry` セクション）
    #[arg(long, env = "DRAINER_CONFIG")]
    config: Option<PathBuf>,

    /// submit する計測値の件数
    #[arg(long, default_value_t = 25)]
    items: u32,

    /// `batch.batch_size` を上書き
    #[arg(long)]
    batch_size: Option<usize>,

    /// `batch.inter_batch_delay_ms` を上書き
    #[arg(long)]
    delay_ms: Option<u64>,

    /// K 回に 1 回 executor を失敗させる（リトライ確認用）
    #[arg(long)]
    flaky_every: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drainer_cli=info,drainer_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // (A) 設定を読む（ファイル → CLI 上書き）
    let mut config = match &cli.config {
        Some(path) => DrainerConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DrainerConfig::default(),
    };
    if let Some(batch_size) = cli.batch_size {
        config.batch.batch_size = batch_size;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.batch.inter_batch_delay_ms = delay_ms;
    }
    config.validate().context("invalid configuration")?;

    // (B) executor をリトライで包んで queue を作る
    let executor = RetryingExecutor::new(
        BodyCompositionExecutor::new(cli.flaky_every),
        config.retry.to_policy(),
    );
    let queue = BatchQueue::builder(executor)
        .window_config(&config.batch)?
        .build()?;

    info!(
        items = cli.items,
        batch_size = config.batch.batch_size,
        delay_ms = config.batch.inter_batch_delay_ms,
        "submitting measurements"
    );

    // (C) 投入（submit は待たない）
    let handles: Vec<_> = (0..cli.items)
        .map(|i| (i, queue.submit(Measurement::sample(i))))
        .collect();

    // (D) 結果を順に待つ
    for (i, handle) in handles {
        let line = match handle.await {
            Ok(Ok(composition)) => json!({ "item": i, "task": "ok", "composition": composition }),
            Ok(Err(invalid)) => json!({ "item": i, "task": "ok", "invalid": invalid.to_string() }),
            Err(err) => {
                warn!(item = i, error = %err, "task failed");
                json!({ "item": i, "task": "failed", "error": err.to_string() })
            }
        };
        println!("{line}");
    }

    queue.wait_idle().await;
    println!("{}", serde_json::to_string_pretty(&queue.stats())?);

    Ok(())
}
