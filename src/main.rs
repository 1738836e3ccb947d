use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskd::{cli::ui::TaskUi, config::TaskdConfig, rest, storage::Storage, tasks::TaskStatus, AppContext};
use tracing::info;

#[derive(Parser)]
#[command(name = "taskd", about = "Task management server and terminal client", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// REST API server port
    #[arg(long, env = "TASKD_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "TASKD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKD_LOG")]
    log: Option<String>,

    /// Bind address for the REST API (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TASKD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "TASKD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the task server (default when no subcommand given).
    ///
    /// Runs the REST API in the foreground.
    ///
    /// Examples:
    ///   taskd serve
    ///   taskd
    Serve,
    /// Open the interactive terminal client.
    ///
    /// Connects to a running task server and presents the task list with
    /// create/edit/delete controls.
    ///
    /// Examples:
    ///   taskd ui
    ///   taskd ui --server http://192.168.1.20:5000
    Ui {
        /// Server URL to connect to (default: http://127.0.0.1:{port})
        #[arg(long, env = "TASKD_API_URL")]
        server: Option<String>,
    },
    /// Replace all tasks with a small demo set.
    ///
    /// Clears the database and inserts three sample tasks. Useful for
    /// trying out the UI against known data.
    ///
    /// Examples:
    ///   taskd seed
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Quieter default for the TUI — stdout logging would garble the screen.
    let in_ui = matches!(args.command, Some(Command::Ui { .. }));
    let config = TaskdConfig::new(
        args.port,
        args.data_dir,
        args.log.or_else(|| in_ui.then(|| "error".to_string())),
        args.bind_address,
    );

    // Init once — must happen before any tracing calls.
    let _file_guard = setup_logging(&config.log, args.log_file.as_deref(), &config.log_format);

    match args.command {
        Some(Command::Ui { server }) => {
            let server = server.unwrap_or_else(|| config.api_base_url.clone());
            TaskUi::new(&server)?.run().await?;
        }
        Some(Command::Seed) => run_seed(config).await?,
        None | Some(Command::Serve) => run_server(config).await?,
    }

    Ok(())
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("taskd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}

/// Open the task store, honoring the `database_url` override.
async fn open_storage(config: &TaskdConfig) -> Result<Storage> {
    match &config.database_url {
        Some(url) => Storage::connect(url).await,
        None => Storage::new(&config.data_dir).await,
    }
}

async fn run_server(config: TaskdConfig) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), data_dir = %config.data_dir.display(), "starting taskd");

    let storage = open_storage(&config).await?;
    let ctx = Arc::new(AppContext {
        config: Arc::new(config),
        storage: Arc::new(storage),
        started_at: std::time::Instant::now(),
    });

    rest::start_rest_server(ctx).await
}

/// `taskd seed` — wipe the table and insert three sample tasks.
async fn run_seed(config: TaskdConfig) -> Result<()> {
    let storage = open_storage(&config).await?;
    storage.delete_all_tasks().await?;

    let demo: &[(&str, &str, TaskStatus)] = &[
        (
            "Set up development environment",
            "Install dependencies and configure the local toolchain",
            TaskStatus::Pending,
        ),
        (
            "Design database schema",
            "Define the task table and its indexes",
            TaskStatus::Done,
        ),
        (
            "Implement task API",
            "CRUD endpoints for tasks over REST",
            TaskStatus::Pending,
        ),
    ];

    for (title, description, status) in demo {
        storage.create_task(title, description, *status).await?;
    }

    let count = storage.count_tasks().await?;
    println!("Seeded {count} task(s).");
    Ok(())
}
