use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use workday_autofill::cli::{Cli, Commands};
use workday_autofill::{Driver, Profile, RunContext, RunOptions, WorkdayBrowser};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_filter())),
        )
        .with_target(false)
        .init();

    let profile = Profile::load(&cli.config)
        .map_err(|e| anyhow!("loading profile {}: {e}", cli.config.display()))?;

    let options = match &cli.command {
        Commands::Apply {
            no_submit,
            max_attempts,
            artifacts_dir,
            ..
        } => RunOptions {
            submit: !no_submit && profile.submit_enabled(),
            max_attempts: *max_attempts,
            artifacts_dir: artifacts_dir.clone(),
            collect_fields: false,
        },
        Commands::Extract { .. } => RunOptions {
            submit: false,
            collect_fields: true,
            ..RunOptions::default()
        },
    };

    let browser = WorkdayBrowser::launch(cli.browser_config(profile.settings()))
        .await
        .map_err(|e| anyhow!("launching Chrome: {e}"))?;
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| anyhow!("opening a tab: {e}"))?;

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current step");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let mut ctx = RunContext::with_cancel_flag(cancel);
    let outcome = Driver::new(&page, &profile, options).run(&mut ctx).await;

    match &cli.command {
        Commands::Apply {
            report: Some(path), ..
        } => write_json(path, ctx.reports())?,
        Commands::Extract { output } => write_json(output, ctx.extracted())?,
        _ => {}
    }

    if let Err(e) = browser.close().await {
        warn!(error = %e, "browser did not close cleanly");
    }

    outcome.map_err(|e| anyhow!("run stopped at step '{}': {e}", ctx.step()))?;
    info!("done");
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "output written");
    Ok(())
}
