use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use labdesk::config::Config;
use labdesk::labstep::http::format_api_error;
use labdesk::{Credentials, EditResources, LabError, LabstepSession, QueryInfo, Table};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Query and edit a Labstep workspace
#[derive(Parser, Debug)]
#[command(name = "labdesk", version, about, long_about = None)]
struct Args {
    /// Workspace to bind (defaults to the last used one)
    #[arg(short, long, global = true)]
    workspace: Option<String>,

    /// Labstep account email
    #[arg(short, long, global = true)]
    email: Option<String>,

    /// Labstep API root
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Log level for debugging; RUST_LOG takes precedence
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Query(QueryCommand),
    /// Create a resource under a category
    AddResource {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        /// Accepted but not yet sent to Labstep
        #[arg(long)]
        alert_threshold: Option<i64>,
    },
}

/// Read-only subcommands
#[derive(Subcommand, Debug)]
enum QueryCommand {
    /// List experiments
    Experiments,
    /// List protocols
    Protocols,
    /// List inventory resources
    Resources,
    /// List devices
    Devices,
    /// Show bookings for a device
    Bookings { device_id: String },
    /// Show the category of a device
    DeviceCategory { device_id: String },
    /// List resource categories
    Categories,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// RUST_LOG wins over `--log-level`; `None` means logging stays off
fn log_filter(level: LogLevel, from_env: Option<EnvFilter>) -> Option<EnvFilter> {
    match (from_env, level) {
        (Some(filter), _) => Some(filter),
        (None, LogLevel::Off) => None,
        (None, level) => Some(EnvFilter::new(level.directive())),
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = log_filter(level, EnvFilter::try_from_default_env().ok())?;

    let log_path = Config::log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("labdesk started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        let message = match err.downcast_ref::<LabError>() {
            Some(LabError::Transport(inner)) => format_api_error(inner),
            Some(lab_err) => lab_err.to_string(),
            None => format_api_error(&err),
        };
        tracing::error!("{:#}", err);
        eprintln!("Error: {}", message);
        // exit skips destructors; flush the log writer first
        drop(log_guard);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();

    let email = args
        .email
        .clone()
        .or_else(|| config.effective_email())
        .context("No Labstep email configured. Set LABSTEP_EMAIL or use --email")?;
    let api_key = config
        .effective_api_key()
        .context("No Labstep API key configured. Set LABSTEP_API_KEY")?;
    let base_url = args
        .api_url
        .clone()
        .unwrap_or_else(|| config.effective_base_url());
    let workspace = args
        .workspace
        .clone()
        .unwrap_or_else(|| config.effective_workspace());

    tracing::info!("Using workspace: {}, API: {}", workspace, base_url);

    let credentials = Credentials::new(&email, &api_key, &config.effective_api_name());
    let session = LabstepSession::authenticate(credentials.clone(), &base_url).await?;

    match args.command {
        Command::AddResource {
            name,
            category,
            alert_threshold,
        } => {
            let edit = EditResources::new(session, credentials, Some(&workspace)).await?;
            remember_workspace(&mut config, &args.workspace, &workspace);
            let created = edit
                .add_new_resource(Some(&name), Some(&category), alert_threshold)
                .await?;
            match args.format {
                OutputFormat::Table => {
                    println!("Resource '{}' created with ID: {}", created.name, created.id)
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&created)?),
            }
        }
        Command::Query(command) => {
            let query = QueryInfo::new(session, credentials, Some(&workspace)).await?;
            remember_workspace(&mut config, &args.workspace, &workspace);
            run_query(&query, command, args.format).await?;
        }
    }

    Ok(())
}

async fn run_query(
    query: &QueryInfo<LabstepSession>,
    command: QueryCommand,
    format: OutputFormat,
) -> Result<()> {
    let table = match command {
        QueryCommand::Experiments => query.get_experiment().await?,
        QueryCommand::Protocols => query.get_protocol().await?,
        QueryCommand::Resources => query.get_resources().await?,
        QueryCommand::Devices => query.get_devices().await?,
        QueryCommand::Categories => query.get_resource_category_id().await?,
        QueryCommand::Bookings { device_id } => {
            let bookings = query.get_device_booking(device_id).await?;
            print_value(&Value::Array(bookings))?;
            return Ok(());
        }
        QueryCommand::DeviceCategory { device_id } => {
            let category = query.get_device_category(device_id).await?;
            print_value(&category)?;
            return Ok(());
        }
    };

    print_table(&table, format)
}

fn print_table(table: &Table, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print!("{}", table),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&table.to_records())?)
        }
    }
    Ok(())
}

/// Bookings and categories are opaque, so they always print as JSON
fn print_value(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Persist a workspace given on the command line once it has resolved
fn remember_workspace(config: &mut Config, requested: &Option<String>, workspace: &str) {
    if requested.is_none() || config.workspace.as_deref() == Some(workspace) {
        return;
    }
    if let Err(e) = config.set_workspace(workspace) {
        tracing::warn!("Failed to save workspace to config: {}", e);
    }
}
