use anyhow::{Context, Result};
use clap::{ArgAction, Args, ColorChoice, CommandFactory, FromArgMatches, Parser, Subcommand};
use roctally::accumulator::Accumulator;
use roctally::config::Config;
use roctally::reader::{self, ReadOutcome, RejectedLine};
use roctally::report::{OutputFormat, Report};
use std::io::{IsTerminal, stdout};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const EXIT_REJECTED: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_INPUT: i32 = 3;

#[derive(Parser)]
#[command(
    name = "roctally",
    about = "Tally detector results per parameter and derive ROC rates",
    arg_required_else_help = true
)]
struct Cli {
    /// Disable color
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Read settings from this TOML file instead of the user config
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print confusion counts and TPR/FPR per parameter
    Report(ReportArgs),
    /// Check a results file for malformed lines
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
struct ReportArgs {
    /// Tab-separated results file (defaults to input.path from config)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output format: human, json or tsv
    #[arg(long, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    /// Decimal places for rates in human and tsv output
    #[arg(long, value_name = "N")]
    precision: Option<usize>,
}

#[derive(Args, Clone)]
struct ValidateArgs {
    /// Tab-separated results file (defaults to input.path from config)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output rejected lines as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: u8, color: ColorChoice) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    // `level` only applies when RUST_LOG does not set one.
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!matches!(color, ColorChoice::Never) && std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load_from(p).context("failed to load configuration"),
        None => Ok(Config::load()),
    }
}

fn resolve_input(file: Option<PathBuf>, config: &Config) -> Result<PathBuf, i32> {
    match file.or_else(|| config.input.path.clone()) {
        Some(path) => Ok(path),
        None => {
            eprintln!("Error: no results file given");
            eprintln!("Usage: roctally report <FILE>");
            eprintln!("Or set [input] path in {}", config_location());
            Err(EXIT_USAGE)
        }
    }
}

fn config_location() -> String {
    Config::config_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "the roctally config file".to_string())
}

fn read_input(path: &Path) -> Result<ReadOutcome, i32> {
    reader::read_results(path)
        .context("failed to read input")
        .map_err(|e| {
            eprintln!("Error: {:#}", e);
            EXIT_INPUT
        })
}

fn run_report(args: ReportArgs, config: &Config, color: ColorChoice) -> Result<(), i32> {
    let path = resolve_input(args.file, config)?;
    let outcome = read_input(&path)?;

    let mut acc = Accumulator::new();
    let skipped = acc.ingest(&outcome.records);
    let report = Report::build(&acc, outcome.rejected.len() + skipped.len());

    let format = args.format.unwrap_or(config.output.format);
    let precision = args.precision.unwrap_or(config.output.precision);
    let want_color = stdout().is_terminal()
        && config.output.color
        && !matches!(color, ColorChoice::Never);

    println!("{}", report.render(format, precision, want_color));
    Ok(())
}

fn render_rejected(rejected: &[RejectedLine]) -> String {
    rejected
        .iter()
        .map(|r| format!("line {}: {}: {:?}", r.line, r.reason, r.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn run_validate(args: ValidateArgs, config: &Config) -> Result<(), i32> {
    let path = resolve_input(args.file, config)?;
    let outcome = read_input(&path)?;

    if args.json {
        match serde_json::to_string_pretty(&outcome.rejected) {
            Ok(s) => println!("{}", s),
            Err(_) => return Err(EXIT_USAGE),
        }
    } else if outcome.rejected.is_empty() {
        println!(
            "{}: {} records, no malformed lines",
            path.display(),
            outcome.records.len()
        );
    } else {
        println!("{}", render_rejected(&outcome.rejected));
    }

    if outcome.rejected.is_empty() {
        Ok(())
    } else {
        Err(EXIT_REJECTED)
    }
}

fn detect_color_choice() -> ColorChoice {
    // Scan args before clap so help/errors honor `--no-color`.
    // Mirror clap's parsing by stopping at `--` which terminates flags.
    let mut args = std::env::args_os();
    args.next();
    let mut flag = false;
    for arg in args {
        if arg == "--" {
            break;
        }
        if arg == "--no-color" {
            flag = true;
            break;
        }
    }
    if flag || std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn main() {
    let color = detect_color_choice();
    let matches = Cli::command().color(color).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    init_tracing(cli.verbose, color);

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_USAGE);
        }
    };

    let result = match cli.command {
        Some(Commands::Report(args)) => run_report(args, &config, color),
        Some(Commands::Validate(args)) => run_validate(args, &config),
        None => Ok(()),
    };
    if let Err(code) = result {
        std::process::exit(code);
    }
}
