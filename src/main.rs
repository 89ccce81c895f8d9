//! Keepup CLI Entry Point
//!
//! Provides command-line interface for running a task configuration.
//!
//! # Usage
//!
//! ```bash
//! # Run the default configuration (~/.config/keepup/keepup.yml)
//! keepup
//!
//! # Run a specific configuration file
//! keepup --config tasks.yml
//!
//! # Run a single group only
//! keepup --config tasks.yml --group build
//!
//! # Preview commands without executing them
//! keepup --dry-run
//!
//! # Print version information as JSON
//! keepup version
//! ```

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info};

use keepup::config::{load_config, to_yaml, DEFAULT_CONFIG_PATH};
use keepup::execution::Engine;
use keepup::{logging, APP_NAME, GIT_SHA, VERSION};

/// What the command line asked for.
#[derive(Debug, PartialEq)]
enum Command {
    Run(Options),
    Version,
    Help,
}

/// Options for a run.
#[derive(Debug, Default, PartialEq)]
struct Options {
    config_path: Option<PathBuf>,
    dry_run: bool,
    verbose: bool,
    group: Option<String>,
}

/// Prints usage information.
fn print_usage() {
    println!("Keepup is a task runner that executes tasks based on a configuration file.");
    println!();
    println!("Usage: {} [OPTIONS]", APP_NAME);
    println!("       {} version", APP_NAME);
    println!();
    println!("Commands:");
    println!("  version             Display detailed version information");
    println!();
    println!("Options:");
    println!(
        "  -c, --config PATH   Path to config file (default is {})",
        DEFAULT_CONFIG_PATH.display()
    );
    println!("  -d, --dry-run       Dry run mode (no changes applied)");
    println!("  -v, --verbose       Debug mode (verbose output)");
    println!("  -g, --group NAME    Group name to run (overrides config file)");
    println!("  -h, --help          Show this help message");
}

/// Renders the version report as a single JSON line.
fn version_json() -> String {
    let info = BTreeMap::from([
        ("arch", env::consts::ARCH),
        ("os", env::consts::OS),
        ("sha", GIT_SHA),
        ("version", VERSION),
    ]);
    serde_json::to_string(&info).unwrap_or_default()
}

/// Parses command-line arguments.
fn parse_arguments(args: &[String]) -> Result<Command, String> {
    let mut options = Options::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = args[i].as_str();

        match arg {
            "version" if i == 1 => {
                if args.len() > 2 {
                    return Err(format!("Unexpected argument: {}", args[2]));
                }
                return Ok(Command::Version);
            }
            "--help" | "-h" => return Ok(Command::Help),
            "--dry-run" | "-d" => options.dry_run = true,
            "--verbose" | "-v" => options.verbose = true,
            "--config" | "-c" => {
                i += 1;
                let path = args
                    .get(i)
                    .ok_or_else(|| format!("{} requires a path argument", arg))?;
                options.config_path = Some(PathBuf::from(path));
            }
            "--group" | "-g" => {
                i += 1;
                let name = args
                    .get(i)
                    .ok_or_else(|| format!("{} requires a group name", arg))?;
                options.group = Some(name.clone());
            }
            _ if arg.starts_with("--config=") => {
                options.config_path = Some(PathBuf::from(&arg["--config=".len()..]));
            }
            _ if arg.starts_with("--group=") => {
                options.group = Some(arg["--group=".len()..].to_string());
            }
            _ if arg.starts_with('-') => return Err(format!("Unknown option: {}", arg)),
            _ => return Err(format!("Unexpected argument: {}", arg)),
        }
        i += 1;
    }

    Ok(Command::Run(options))
}

/// Loads the configuration and executes it.
fn run(options: Options) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = options
        .config_path
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.clone());

    let mut config = load_config(&config_path).map_err(|e| {
        eprintln!("Error loading config: {}", e);
        "unable to load configuration file"
    })?;

    logging::init(&config.settings.logging, options.verbose)?;

    if options.verbose {
        info!("Config file found at: {}", config_path.display());
        println!("{}", to_yaml(&config)?);
    }

    if let Some(ref name) = options.group {
        config.restrict_to_group(name)?;
        info!("Execution filtered by group: {}.", name);
    }

    let mut engine = Engine::new(config);
    if options.dry_run {
        engine.set_dry_run(true);
    }

    engine.run().map_err(|e| {
        error!("Execution failed: {}", e);
        e
    })?;

    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let command = match parse_arguments(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match command {
        Command::Help => {
            print_usage();
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("{}", version_json());
            ExitCode::SUCCESS
        }
        Command::Run(options) => match run(options) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}
