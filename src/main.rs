use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use sharelink::cli::{Cli, Commands};
use sharelink::config::{StaticConfig, get_config, init_config_with};
use sharelink::runtime::{listen_for_shutdown, prepare_startup};
use sharelink::system::init_logging;

/// 加载配置并初始化日志
fn bootstrap(config_path: &str) -> anyhow::Result<(Arc<StaticConfig>, WorkerGuard)> {
    init_config_with(StaticConfig::load_from(config_path));
    let config = get_config();
    let guard = init_logging(&config.logging)?;
    Ok((config, guard))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::ConfigGen { output_path } => {
            let sample = StaticConfig::generate_sample_config();
            match output_path {
                Some(path) => {
                    std::fs::write(&path, sample)
                        .with_context(|| format!("Failed to write sample config to {}", path))?;
                    println!("Sample configuration written to {}", path);
                }
                None => print!("{}", sample),
            }
        }
        Commands::Serve => {
            let (config, _guard) = bootstrap(&cli.config)?;
            let ctx = prepare_startup(&config, true).await?;

            if config.cleanup.enabled {
                ctx.cleanup.clone().spawn_background_task(
                    config.cleanup.interval_hours,
                    config.cleanup.initial_delay_secs,
                );
            } else {
                info!("Cleanup scheduler disabled");
            }

            info!("sharelink is running, press Ctrl-C to stop");
            listen_for_shutdown(&ctx).await;
        }
        Commands::Cleanup => {
            let (config, _guard) = bootstrap(&cli.config)?;
            let ctx = prepare_startup(&config, false).await?;
            let report = ctx.cleanup.run_once(Utc::now()).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Analytics {
            share_link_id,
            days,
        } => {
            let (config, _guard) = bootstrap(&cli.config)?;
            let ctx = prepare_startup(&config, false).await?;
            let report = ctx
                .analytics
                .get_access_analytics(&share_link_id, days)
                .await
                .map_err(|e| anyhow::anyhow!(e.format_simple()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
