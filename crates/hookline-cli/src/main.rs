mod handlers;
mod server;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hookline_core::app::Scheduler;
use hookline_core::impls::{HttpExecutor, InMemoryStore};
use hookline_core::ports::{
    CallbackStore, IdGenerator, SequenceIdGenerator, SystemClock, UlidGenerator,
};

use crate::server::AppState;
use crate::settings::{IdKind, Settings};

/// hookline - deferred webhook dispatcher
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML config file, skipped when missing
    #[arg(short, long, default_value = "hookline.toml")]
    config: PathBuf,

    /// Listen address, overrides `server.listen`
    #[arg(short, long)]
    listen: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    if let Some(listen) = cli.listen {
        settings.server.listen = listen;
    }

    let ids: Arc<dyn IdGenerator> = match settings.ids.kind {
        IdKind::Sequence => Arc::new(SequenceIdGenerator::new()),
        IdKind::Ulid => Arc::new(UlidGenerator::new(SystemClock)),
    };
    let store: Arc<dyn CallbackStore> = Arc::new(InMemoryStore::new(ids, settings.store.buffer));
    let executor =
        HttpExecutor::new(settings.executor.timeout()).context("failed to build HTTP client")?;

    let scheduler = Scheduler::new(
        Arc::clone(&store),
        Arc::new(executor),
        settings.scheduler.to_scheduler_config(),
    )
    .spawn();

    let app = server::build_app(AppState::new(store, Arc::new(SystemClock)));
    let listener = TcpListener::bind(&settings.server.listen)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.listen))?;
    info!(listen = %settings.server.listen, "listening");

    let (stop_http, http_stopped) = oneshot::channel::<()>();
    let mut http = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = http_stopped.await;
            })
            .await
    });

    tokio::select! {
        _ = shutdown_signal() => {}
        res = &mut http => {
            scheduler.shutdown_and_join().await?;
            res.context("http server task failed")?
                .context("http server stopped unexpectedly")?;
            return Ok(());
        }
    }

    // 新規 callback の受け付けを先に止めてから HTTP を閉じる
    scheduler.request_shutdown();
    let _ = stop_http.send(());

    http.await
        .context("http server task failed")?
        .context("http server error")?;
    scheduler
        .shutdown_and_join()
        .await
        .context("scheduler did not stop cleanly")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "received signal"),
        _ = terminate => info!(signal = "SIGTERM", "received signal"),
    }
}
