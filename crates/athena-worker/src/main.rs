use anyhow::Context;
use athena_core::{decode_task, encode_result, encode_task_pretty};
use athena_worker::{Worker, WorkerConfig};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "athena-worker")]
#[command(version, about = "Athena task processing worker", long_about = None)]
struct Args {
    /// Path to configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker ID (auto-generated if not provided)
    #[arg(long, global = true)]
    worker_id: Option<String>,

    /// Heartbeat interval in milliseconds
    #[arg(long, global = true)]
    heartbeat_interval_ms: Option<u64>,

    /// Log filter, e.g. "info" or "athena_worker=debug"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the worker until interrupted (default)
    Run,
    /// Process a single JSON-encoded task and print its result
    Process {
        /// Task file, or "-" for stdin
        #[arg(long, default_value = "-")]
        file: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = WorkerConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    // Override with CLI args
    if let Some(worker_id) = args.worker_id {
        config.worker.worker_id = Some(worker_id);
    }
    if let Some(interval) = args.heartbeat_interval_ms {
        config.worker.heartbeat_interval_ms = interval;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.json = true;
    }
    config.validate().context("invalid configuration")?;

    init_tracing(&config);

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Process { file } => process_one(config, &file).await,
    }
}

fn init_tracing(config: &WorkerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(config: WorkerConfig) -> anyhow::Result<()> {
    let worker = Arc::new(Worker::new(config.worker));

    eprintln!();
    eprintln!("╔═══════════════════════════════════════════╗");
    eprintln!("║   ATHENA WORKER                           ║");
    eprintln!("║   Task Processing Service                 ║");
    eprintln!("╚═══════════════════════════════════════════╝");
    eprintln!();

    let signals = ShutdownSignals::install().context("failed to install signal handlers")?;

    info!(
        worker_id = worker.id(),
        version = env!("CARGO_PKG_VERSION"),
        "Athena worker starting"
    );

    supervise(Arc::clone(&worker), signals.recv()).await?;

    let stats = worker.stats();
    info!(
        heartbeats = stats.heartbeats,
        tasks_processed = stats.tasks_processed(),
        "Worker shutdown complete"
    );
    Ok(())
}

/// Run the worker until `signal` resolves, then drain it.
///
/// A failing signal listener stops the worker and is reported as an error.
async fn supervise<F>(worker: Arc<Worker>, signal: F) -> anyhow::Result<()>
where
    F: Future<Output = std::io::Result<&'static str>> + Send + 'static,
{
    let cancel = CancellationToken::new();

    // Handle shutdown signals
    let signal_worker = Arc::clone(&worker);
    let signal_cancel = cancel.clone();
    let listener = tokio::spawn(async move {
        let received = signal.await;
        match &received {
            Ok(signal) => {
                info!(signal = *signal, "Received shutdown signal");
                signal_worker.request_shutdown();
            }
            Err(e) => error!(error = %e, "Signal listener failed, stopping worker"),
        }
        signal_cancel.cancel();
        received.map(|_| ())
    });

    let outcome = worker.start(cancel.clone()).await;

    if cancel.is_cancelled() {
        listener
            .await
            .context("signal listener panicked")?
            .context("signal listener failed")?;
    } else {
        listener.abort();
    }

    finish(outcome)
}

/// Map the worker outcome to the process outcome; cancellation is a clean exit.
fn finish(outcome: athena_worker::Result<()>) -> anyhow::Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => {
            error!(error = %e, "Worker failed");
            Err(e.into())
        }
    }
}

async fn process_one(config: WorkerConfig, file: &str) -> anyhow::Result<()> {
    let bytes = if file == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("failed to read task from stdin")?;
        buf
    } else {
        tokio::fs::read(file)
            .await
            .with_context(|| format!("failed to read task file {}", file))?
    };

    let task = decode_task(&bytes).context("failed to decode task")?;
    if let Ok(pretty) = encode_task_pretty(&task) {
        debug!(task = %pretty, "Decoded task");
    }

    let worker = Worker::new(config.worker);
    let result = worker.process_task(&task).await?;

    let encoded = encode_result(&result)?;
    println!("{}", String::from_utf8_lossy(&encoded));
    Ok(())
}

/// Process signal handlers, registered before the worker starts.
struct ShutdownSignals {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    #[cfg(unix)]
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(ShutdownSignals {
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    fn install() -> std::io::Result<Self> {
        Ok(ShutdownSignals {})
    }

    /// Wait for SIGINT or SIGTERM and return the signal name.
    #[cfg(unix)]
    async fn recv(mut self) -> std::io::Result<&'static str> {
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
            _ = self.terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    async fn recv(self) -> std::io::Result<&'static str> {
        tokio::signal::ctrl_c().await?;
        Ok("ctrl-c")
    }
}
