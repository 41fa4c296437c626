// LogPane - main.rs
//
// Command-line front end. Handles:
// 1. CLI argument parsing
// 2. Configuration loading and logging initialisation
// 3. Choosing the file (explicit path, active log, latest log)
// 4. Loading through the view state and printing the visible rows

use clap::Parser;
use logpane::app::locator::FsLocator;
use logpane::app::state::LogViewState;
use logpane::core::filter::FilterField;
use logpane::core::model::{ReadStatus, Row};
use logpane::platform::config::{load_config, load_config_file, AppConfig, PlatformPaths};
use logpane::util::{constants, logging};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// LogPane - read a delimited, multi-line application log and filter it.
///
/// Without PATH the log file the application is currently writing is used,
/// falling back to the most recently modified `*.log` in the log directory.
#[derive(Parser, Debug)]
#[command(name = "logpane", version, about)]
struct Cli {
    /// Log file to read.
    path: Option<PathBuf>,

    /// Field delimiter (literal, not a regex).
    #[arg(long)]
    delimiter: Option<String>,

    /// Field holding the timestamp that opens an entry.
    #[arg(long = "marker-index")]
    marker_index: Option<usize>,

    /// Read budget in seconds; partial results are shown when it runs out.
    #[arg(long = "timeout-secs")]
    timeout_secs: Option<u64>,

    /// Hide INFO rows.
    #[arg(long = "hide-info")]
    hide_info: bool,

    /// Hide TRACE rows.
    #[arg(long = "hide-trace")]
    hide_trace: bool,

    /// Hide DEBUG rows.
    #[arg(long = "hide-debug")]
    hide_debug: bool,

    /// Substring of the formatted timestamp, e.g. "2025-09-11  20:15".
    #[arg(long)]
    date: Option<String>,

    /// Substring of the level.
    #[arg(long)]
    level: Option<String>,

    /// Substring of the source file.
    #[arg(long)]
    source: Option<String>,

    /// Substring of the member name.
    #[arg(long)]
    member: Option<String>,

    /// Substring of the message.
    #[arg(long)]
    message: Option<String>,

    /// Print rows as JSON lines.
    #[arg(long)]
    json: bool,

    /// Explicit config file (default: config.toml in the platform config dir).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let paths = PlatformPaths::resolve();

    let (config, warnings) = match &cli.config {
        Some(path) => match load_config_file(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(2);
            }
        },
        None => load_config(&paths.config_dir),
    };

    logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "LogPane starting"
    );
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    let mut options = config.read_options();
    if let Some(delimiter) = cli.delimiter.clone().filter(|d| !d.is_empty()) {
        options.delimiter = delimiter;
    }
    if let Some(index) = cli.marker_index {
        options.marker_index = index;
    }
    let timeout = cli
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(config.timeout);

    let mut state = LogViewState::new(options, timeout);
    apply_cli_filters(&mut state, &cli, &config);

    match cli.path.clone() {
        Some(path) => {
            state.start_load(path);
        }
        None => {
            let log_dir = config
                .log_directory
                .clone()
                .unwrap_or_else(|| paths.log_dir(&config.app_dir));
            let locator = FsLocator::for_current_process(log_dir, config.app_version.as_deref());
            state.load_active_or_latest(&locator);
        }
    }

    state.wait_until_idle();

    if state.last_status().publishes_rows() {
        if let Err(e) = print_rows(&state, cli.json) {
            if e.kind() != io::ErrorKind::BrokenPipe {
                eprintln!("Error: failed to write rows: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(name) = state.selected_file() {
        eprintln!("{name}: {}", state.status_message());
    } else {
        eprintln!("{}", state.status_message());
    }

    match state.last_status() {
        ReadStatus::Ok | ReadStatus::Cancelled => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Config toggles are the baseline; CLI flags can only switch them on.
fn apply_cli_filters(state: &mut LogViewState, cli: &Cli, config: &AppConfig) {
    let criteria = state.criteria_mut();
    criteria.set_hide_info(cli.hide_info || config.hide_info);
    criteria.set_hide_trace(cli.hide_trace || config.hide_trace);
    criteria.set_hide_debug(cli.hide_debug || config.hide_debug);

    let texts = [
        (FilterField::Timestamp, &cli.date),
        (FilterField::Level, &cli.level),
        (FilterField::Source, &cli.source),
        (FilterField::Member, &cli.member),
        (FilterField::Message, &cli.message),
    ];
    for (field, value) in texts {
        criteria.set_text(field, value.clone());
    }
}

fn print_rows(state: &LogViewState, json: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for row in state.visible_rows() {
        if json {
            serde_json::to_writer(&mut out, row).map_err(io::Error::other)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", format_row(row))?;
        }
    }
    out.flush()
}

fn format_row(row: &Row) -> String {
    let timestamp = if row.has_timestamp() {
        row.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    } else {
        String::new()
    };
    format!(
        "{timestamp} | {:<5} | {} | {} | {}",
        row.level, row.source, row.member, row.message
    )
}
