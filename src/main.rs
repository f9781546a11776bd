//=====================================================
// File: main.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: cexpand CLI entry point
// Objective: Command-line interface for expanding templates, evaluating
//            snippets and checking generated assertions
//=====================================================

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cexpand::runtime::parse_definition;
use cexpand::verify;
use cexpand::{ExpandConfig, ExpandOptions, ExpandSession};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "CEXPAND_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "cexpand",
    version,
    about = "Expand $(...) and :(...) macros in C test templates"
)]
pub struct Args {
    /// Configuration file (default: ./cexpand.toml, then the user config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Expand one or more templates; `-` reads a template from stdin.
    Expand(ExpandArgs),
    /// Evaluate an expression or run a chunk and print the result.
    Eval(EvalArgs),
    /// Recompute the assertions of a generated C file.
    Verify(VerifyArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExpandArgs {
    /// Template files, expanded in order into one output.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file (default: stdout). Parent directories are created.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Script library to load before expanding.
    #[arg(short = 'l', long = "library")]
    pub libraries: Vec<PathBuf>,

    /// Chunk to run before expanding.
    #[arg(short = 'e', long = "exec")]
    pub chunks: Vec<String>,

    /// Define a global as NAME=VALUE.
    #[arg(short = 'D', long = "define", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EvalArgs {
    /// Expression or chunk to evaluate.
    pub code: String,

    /// Script library to load first.
    #[arg(short = 'l', long = "library")]
    pub libraries: Vec<PathBuf>,

    /// Define a global as NAME=VALUE.
    #[arg(short = 'D', long = "define", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct VerifyArgs {
    /// Generated C source to check.
    pub file: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

fn parse_define(text: &str) -> Result<(String, String), String> {
    parse_definition(text).map_err(|err| err.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let (config, config_path) = ExpandConfig::load(args.config.as_deref())?;
    init_tracing(&args, &config);
    if let Some(path) = &config_path {
        debug!(config = %path.display(), "loaded configuration");
    }

    match args.command {
        Command::Expand(cmd) => expand(cmd, &config),
        Command::Eval(cmd) => eval(cmd, &config),
        Command::Verify(cmd) => verify_file(cmd),
    }
}

fn init_tracing(args: &Args, config: &ExpandConfig) {
    let level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => config.logging.level.as_str(),
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    // Logs share stderr with diagnostics; stdout carries expansions.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn expand(cmd: ExpandArgs, config: &ExpandConfig) -> Result<ExitCode> {
    let options = ExpandOptions {
        inputs: cmd.inputs,
        output: cmd.output,
        libraries: cmd.libraries,
        chunks: cmd.chunks,
        defines: cmd.defines,
    };
    let session = ExpandSession::new(options, config)?;
    if let Some(text) = session.run()? {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .and_then(|()| stdout.flush())
            .context("writing expansion to stdout")?;
    }
    Ok(ExitCode::SUCCESS)
}

fn eval(cmd: EvalArgs, config: &ExpandConfig) -> Result<ExitCode> {
    let options = ExpandOptions {
        libraries: cmd.libraries,
        defines: cmd.defines,
        ..ExpandOptions::default()
    };
    let mut session = ExpandSession::new(options, config)?;
    if let Some(value) = session.evaluate(&cmd.code)? {
        println!("{value}");
    }
    Ok(ExitCode::SUCCESS)
}

fn verify_file(cmd: VerifyArgs) -> Result<ExitCode> {
    let source = fs::read_to_string(&cmd.file)
        .with_context(|| format!("reading {}", cmd.file.display()))?;
    let report = verify::verify_source(&source)
        .with_context(|| format!("checking {}", cmd.file.display()))?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

//=====================================================
// End of file
//=====================================================
