//! Agent Bridge - stream chat turns through external AI agent CLIs.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use agent_bridge::config::{BridgeConfig, ConfigError, ConfigLoader, ConfigProvider};
use agent_bridge::display::{self, JsonPrinter, StreamPrinter};
use agent_bridge::runner::{EventSink, ProcessSession, RunRequest};
use agent_bridge::store::{SessionStore, StoreError};
use agent_bridge::vendor::{adapter_for, ModeInstructions, VendorAdapter, VendorKind};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VendorArg {
    Claude,
    Gemini,
    Codex,
}

impl From<VendorArg> for VendorKind {
    fn from(arg: VendorArg) -> Self {
        match arg {
            VendorArg::Claude => VendorKind::Claude,
            VendorArg::Gemini => VendorKind::Gemini,
            VendorArg::Codex => VendorKind::Codex,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "agent-bridge",
    about = "Stream chat turns through external AI agent CLIs",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use this config file instead of the default search paths.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt to a vendor CLI and stream the reply.
    Run(RunArgs),
    /// Check which vendor CLIs are installed.
    Check {
        /// Only check this vendor.
        #[arg(long, value_enum)]
        vendor: Option<VendorArg>,
    },
    /// List stored session ids.
    Sessions {
        /// Forget every stored session.
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Vendor CLI to run.
    #[arg(long, value_enum)]
    vendor: VendorArg,
    /// Resume this session instead of the stored one.
    #[arg(long, conflicts_with = "new")]
    resume: Option<String>,
    /// Start a fresh session.
    #[arg(long)]
    new: bool,
    /// File with mode instructions; the file stem names the mode.
    #[arg(long, value_name = "FILE")]
    mode: Option<PathBuf>,
    /// Emit events and the result as JSON lines.
    #[arg(long)]
    json: bool,
    /// Do not truncate tool output.
    #[arg(long)]
    raw: bool,
    /// Cancel the run after this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// The prompt to send.
    #[arg(required = true, trailing_var_arg = true)]
    prompt: Vec<String>,
}

/// Errors surfaced by the command-line front end.
#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("Config file not found: {0}")]
    ConfigMissing(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Failed to read mode file {path}: {source}")]
    Mode {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<BridgeConfig, CliError> {
    let loader = match path {
        Some(path) if !path.exists() => return Err(CliError::ConfigMissing(path)),
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    Ok(loader.load()?)
}

/// Cancel `token` on Ctrl-C or after `timeout`.
fn spawn_cancellers(
    token: &CancellationToken,
    timeout: Option<Duration>,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::new();

    let ctrl_c = token.clone();
    handles.push(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling run");
            ctrl_c.cancel();
        }
    }));

    if let Some(timeout) = timeout {
        let timer = token.clone();
        handles.push(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::info!(secs = timeout.as_secs(), "Timeout reached, cancelling run");
            timer.cancel();
        }));
    }

    handles
}

async fn run_command(config: &BridgeConfig, args: RunArgs) -> Result<bool, CliError> {
    let vendor = VendorKind::from(args.vendor);

    let mut store = match SessionStore::open_default() {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(error = %e, "Session store unavailable");
            None
        }
    };

    let resume = match (args.resume, args.new) {
        (Some(id), _) => Some(id),
        (None, true) => None,
        (None, false) => store
            .as_ref()
            .and_then(|s| s.get(vendor))
            .map(String::from),
    };

    let mut request = RunRequest::new(args.prompt.join(" "));
    if let Some(id) = &resume {
        request = request.resume(id.clone());
    }
    if let Some(path) = args.mode {
        let instructions =
            ModeInstructions::from_file(&path).map_err(|source| CliError::Mode { path, source })?;
        request = request.mode_instructions(instructions);
    }

    let cancel = CancellationToken::new();
    request = request.cancellation(cancel.clone());
    let cancellers = spawn_cancellers(&cancel, args.timeout.map(Duration::from_secs));

    if !args.json {
        display::print_run_start(vendor, resume.as_deref(), args.raw);
    }

    let mut session = ProcessSession::new(adapter_for(vendor, config))
        .with_debug(config.debug_enabled());
    let mut printer = StreamPrinter::new(args.raw);
    let mut json = JsonPrinter;
    let sink: &mut dyn EventSink = if args.json { &mut json } else { &mut printer };
    let result = session.run(request, sink).await;

    for handle in cancellers {
        handle.abort();
    }

    if let (Some(store), Some(id)) = (store.as_mut(), result.session_id.as_deref()) {
        store.set(vendor, id);
        if let Err(e) = store.save() {
            tracing::warn!(error = %e, "Failed to save session store");
        }
    }

    if args.json {
        display::print_result_json(&result);
    } else {
        printer.finish_line();
        display::print_run_end(vendor, &result, args.raw);
    }

    Ok(result.success)
}

async fn check_command(config: &BridgeConfig, only: Option<VendorArg>) -> bool {
    let kinds: Vec<VendorKind> = match only {
        Some(arg) => vec![arg.into()],
        None => VendorKind::ALL.to_vec(),
    };

    let mut all_installed = true;
    for kind in kinds {
        let adapter = adapter_for(kind, config);
        let status = adapter.check_installation().await;
        all_installed &= status.installed;
        display::print_installation(kind, &status, adapter.install_guidance());
    }
    all_installed
}

fn sessions_command(clear: bool) -> Result<(), CliError> {
    let mut store = SessionStore::open_default()?;
    if clear {
        store.clear();
        store.save()?;
        display::print_info("Cleared stored sessions");
    } else {
        display::print_sessions(store.iter());
    }
    Ok(())
}

async fn dispatch(cli: Cli) -> Result<bool, CliError> {
    let config = load_config(cli.config)?;
    tracing::debug!(debug = config.debug_enabled(), "Configuration loaded");

    match cli.command {
        Commands::Run(args) => run_command(&config, args).await,
        Commands::Check { vendor } => Ok(check_command(&config, vendor).await),
        Commands::Sessions { clear } => sessions_command(clear).map(|()| true),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
