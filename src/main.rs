//! Terminal DevByte viewer
//!
//! Prints the cached playlist, refreshes it in the background and opens the
//! video for a typed row number. `r` refreshes, `q` quits.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use devbyte_viewer::core::presenter::NETWORK_ERROR_MESSAGE;
use devbyte_viewer::utils::{check_connectivity, init_tracing, local_logging_enabled};
use devbyte_viewer::{
    AppConfig, AppContext, FnNotifier, LaunchDecision, PresenterUpdate, SyncOutcome, SyncRuntimeHandle,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // tracing goes up before anything that may log, including config fallback
    let loaded = AppConfig::load();
    let log_level = match &loaded {
        Ok(config) if config.validate().is_ok() => config.advanced.log_level.clone(),
        _ => AppConfig::default().advanced.log_level,
    };
    init_tracing(&log_level);
    let context = AppContext::with_config(AppContext::config_or_default(loaded)).await?;
    info!(
        "🚀 {} v{} starting (file logging: {})",
        devbyte_viewer::NAME,
        devbyte_viewer::VERSION,
        local_logging_enabled()
    );

    let runtime = context.start_runtime();
    let mut presenter = context.presenter(FnNotifier(|| eprintln!("⚠️  {NETWORK_ERROR_MESSAGE}")));
    print_rows(&presenter.render_lines());

    if context.config.sync.refresh_on_start {
        request_refresh(&runtime, &context);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            update = presenter.next_update() => match update {
                Some(PresenterUpdate::PlaylistReplaced { .. }) => print_rows(&presenter.render_lines()),
                Some(PresenterUpdate::StatusChanged(_)) => {}
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "q" | "quit" => break,
                    "r" | "refresh" => request_refresh(&runtime, &context),
                    "" => print_rows(&presenter.render_lines()),
                    // handler probes shell out; keep them off the async workers
                    input => tokio::task::block_in_place(|| {
                        handle_click(&presenter, context.config.launch.open_on_click, input)
                    }),
                }
            }
        }
    }

    let _ = runtime.shutdown().await;
    Ok(())
}

/// Refresh off the input loop; results arrive through the presenter
fn request_refresh(runtime: &SyncRuntimeHandle, context: &AppContext) {
    let runtime = runtime.clone();
    let endpoint = context.config.endpoint_url().ok();
    let timeout = Duration::from_secs(context.config.remote.timeout_seconds);
    tokio::spawn(async move {
        if let Ok(SyncOutcome::Failed(failure)) = runtime.refresh_now().await {
            let reachable = match endpoint {
                Some(endpoint) => check_connectivity(&endpoint, timeout).await,
                None => false,
            };
            warn!("Refresh failed: {} (host reachable: {})", failure, reachable);
        }
    });
}

fn handle_click<N, T>(
    presenter: &devbyte_viewer::ListPresenter<N, T>,
    open_on_click: bool,
    input: &str,
) where
    N: devbyte_viewer::ErrorNotifier,
    T: devbyte_viewer::LaunchTarget,
{
    let Some(position) = input.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
        eprintln!("Enter a row number, r or q");
        return;
    };

    let decision = if open_on_click {
        presenter.click(position)
    } else {
        presenter
            .rows()
            .get(position)
            .map(|video| presenter.resolver().resolve(video))
    };

    match decision {
        Some(LaunchDecision::App(uri)) => println!("▶ {uri}"),
        Some(LaunchDecision::Web(url)) => println!("🌐 {url}"),
        None => eprintln!("No row {}", position + 1),
    }
}

fn print_rows(lines: &[String]) {
    if lines.is_empty() {
        println!("(no videos yet)");
        return;
    }
    for line in lines {
        println!("{line}");
    }
}
