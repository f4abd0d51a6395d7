use anyhow::Result;
use metricsview::models::{ModeKind, RangeWindow};
use metricsview::sink::TerminalSink;
use metricsview::view_mode::UserAction;
use metricsview::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Maps one stdin line to a control action: `latest`, `range`, `window <minutes>`, `refresh`.
fn parse_command(line: &str) -> Result<UserAction> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("refresh" | "r"), None) => Ok(UserAction::Refresh),
        (Some("window" | "w"), Some(minutes)) => {
            let minutes: u32 = minutes.parse()?;
            let window = RangeWindow::try_from(minutes).map_err(anyhow::Error::msg)?;
            Ok(UserAction::SelectWindow(window))
        }
        (Some(mode), None) => {
            let kind: ModeKind = mode.parse().map_err(anyhow::Error::msg)?;
            Ok(UserAction::SelectMode(kind))
        }
        _ => anyhow::bail!("unrecognized command {:?}", line.trim()),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let source = HttpSource::new(&app_config.source.base_url)?;

    match source.health().await {
        Ok(h) => {
            tracing::info!(status = %h.status, url = %source.base_url(), "metrics source reachable")
        }
        Err(e) => tracing::warn!(
            error = %e,
            url = %source.base_url(),
            "metrics source health check failed"
        ),
    }

    let dashboard = Dashboard::new(
        source,
        TerminalSink,
        app_config.dashboard_settings(),
        app_config.initial_view(),
    );
    tracing::info!(
        view = %dashboard.view_mode(),
        version = version::VERSION,
        "Dashboard started; commands: latest | range | window <minutes> | refresh"
    );
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut stopping = false;
    tokio::select! {
        outcome = dashboard.start() => tracing::debug!(?outcome, "initial refresh"),
        _ = &mut shutdown => {
            tracing::info!("Received shutdown signal");
            stopping = true;
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    while !stopping {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                // Without a terminal keep auto-refreshing until a signal arrives.
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let action = match parse_command(&line) {
                    Ok(action) => action,
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring command");
                        continue;
                    }
                };
                // A command's refresh may block on a slow source; the signal still wins.
                tokio::select! {
                    outcome = dashboard.handle(action) => {
                        tracing::debug!(?outcome, "command handled");
                    }
                    _ = &mut shutdown => {
                        tracing::info!("Received shutdown signal");
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    dashboard.shutdown().await;
    Ok(())
}
