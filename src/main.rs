//! Ethereum Vanity Address Bot
//!
//! Local console front end: each stdin line is handled as a chat message.
//!
//! Usage:
//!   eth_vanity_bot                  # then type: /generate dead
//!   eth_vanity_bot -t 300 -o keys   # 5 minute limit, save records to ./keys

use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use eth_vanity_bot::delivery::{spawn_line_reader, Command, KeypairRecord, Reply};
use eth_vanity_bot::worker::LogProgress;
use eth_vanity_bot::{
    CancelReason, Config, Pattern, RequestCoordinator, SearchEngine, WorkerPool,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("eth_vanity_bot=info".parse()?),
        )
        .init();

    let config = Config::parse();
    config.validate().context("configuration error")?;

    let pool = Arc::new(
        WorkerPool::new(config.worker_count()).context("failed to start worker threads")?,
    );
    let engine = SearchEngine::new(config.progress_interval, Arc::new(LogProgress));
    let coordinator = Arc::new(RequestCoordinator::new(
        pool.clone(),
        engine,
        config.policy(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
    })
    .context("failed to set Ctrl-C handler")?;

    info!(
        workers = pool.num_workers(),
        timeout_secs = config.timeout_secs,
        "bot started, reading commands from stdin"
    );

    let mut lines =
        spawn_line_reader(BufReader::new(io::stdin())).context("failed to start stdin reader")?;
    let mut requests = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.recv() => match line.transpose().context("failed to read stdin")? {
                Some(line) => {
                    let Some(command) = Command::parse(&line) else { continue };
                    requests.spawn(serve(
                        command,
                        coordinator.clone(),
                        config.save_dir.clone(),
                        shutdown_rx.clone(),
                    ));
                }
                None => break,
            },
            Some(joined) = requests.join_next(), if !requests.is_empty() => {
                joined.context("request task failed")??;
            }
            _ = shutdown_signal(shutdown_rx.clone()) => {
                info!("shutdown requested");
                break;
            }
        }
    }

    // Let in-flight requests finish; Ctrl-C cancels them.
    while let Some(joined) = requests.join_next().await {
        joined.context("request task failed")??;
    }

    info!(
        completed = pool.completed(),
        attempts = pool.total_attempts(),
        elapsed_secs = pool.elapsed().as_secs(),
        "shutting down"
    );
    pool.shutdown();

    Ok(())
}

/// Handles one command. Only a fatal request error is returned.
async fn serve(
    command: Command,
    coordinator: Arc<RequestCoordinator>,
    save_dir: Option<PathBuf>,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let quick_reply = match command {
        Command::Generate { prefix, suffix } => match coordinator.validate(&prefix, &suffix) {
            Ok(pattern) => return search(pattern, &coordinator, save_dir, shutdown).await,
            Err(e) => Reply::from_error(&e),
        },
        Command::Start => Reply::Welcome,
        Command::MissingArgument => Reply::Usage,
        Command::Unknown(_) => Reply::UnknownCommand,
    };
    respond(quick_reply);
    Ok(())
}

async fn search(
    pattern: Pattern,
    coordinator: &RequestCoordinator,
    save_dir: Option<PathBuf>,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    respond(Reply::searching(&pattern));

    let outcome = coordinator
        .search(pattern.clone(), shutdown_signal(shutdown))
        .await;

    if let (Ok(found), Some(dir)) = (&outcome, &save_dir) {
        match KeypairRecord::new(&pattern, found).save(dir).await {
            Ok(path) => info!(path = %path.display(), "keypair record saved"),
            Err(e) => warn!(error = %e, "failed to save keypair record"),
        }
    }

    respond(Reply::from_outcome(&outcome));

    match outcome {
        Err(e) if e.is_fatal() => {
            error!(error = %e, "stopping: cannot continue without secure randomness");
            Err(e.into())
        }
        _ => Ok(()),
    }
}

fn respond(reply: Reply) {
    println!("{}\n", reply);
}

async fn shutdown_signal(mut shutdown: watch::Receiver<bool>) -> CancelReason {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        // Sender gone: no shutdown will ever be requested
        std::future::pending::<()>().await;
    }
    CancelReason::Shutdown
}
