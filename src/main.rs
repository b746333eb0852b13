//! cwlstage CLI Entry Point
//!
//! Runs one staging operation per invocation, for orchestrators that call
//! the execution engine themselves.
//!
//! # Usage
//!
//! ```bash
//! # Write the engine's input-binding document
//! cwlstage --base-dir /data/run1 inputs request.yaml inputs.yml
//!
//! # Package the provenance directory
//! cwlstage archive /data/run1/prov/execution_create.zip /data/run1/prov
//!
//! # Resolve declared outputs against the engine's results
//! cwlstage outputs outputs.yaml results.json /data/run1/prov
//!
//! # Export the workflow RO-Crate
//! cwlstage crate https://example.org/wf.cwl inputs.yml /data/run1/ro-crate
//! ```

use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::{error, info};

use cwlstage::monitoring::LogReporter;
use cwlstage::staging::{ArchiveError, BindingDocument, StagingRequest};
use cwlstage::{load_config, OutputSpec, RoCrateBuilder, StagingConfig, Workflow};
use cwlstage::{APP_NAME, VERSION};

/// Exit code used when provenance data would be lost.
const FATAL_EXIT_CODE: i32 = 70;

/// Staging operation selected on the command line.
#[derive(Debug, PartialEq)]
enum Command {
    Inputs { request: PathBuf, target: PathBuf },
    Outputs { specs: PathBuf, results: PathBuf, provenance: PathBuf },
    Archive { target: PathBuf, provenance: PathBuf },
    Crate { workflow_url: String, bindings: PathBuf, target: PathBuf },
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    command: Option<Command>,
    config_path: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    verbose: bool,
}

/// Outcome of argument parsing that short-circuits the run.
#[derive(Debug, PartialEq)]
enum EarlyExit {
    Help,
    Version,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: cwlstage [OPTIONS] <COMMAND> [ARGS...]");
    println!();
    println!("Commands:");
    println!("  inputs  <REQUEST> <TARGET>                 Write the input-binding document");
    println!("  outputs <SPECS> <RESULTS> <PROVENANCE_DIR> Resolve declared outputs (JSON on stdout)");
    println!("  archive <TARGET> <PROVENANCE_DIR>          Package the provenance directory");
    println!("  crate   <WORKFLOW_URL> <BINDINGS> <TARGET> Export the workflow RO-Crate");
    println!();
    println!("Options:");
    println!("  --base-dir PATH     Workflow base directory (default: current directory)");
    println!("  --config PATH       Staging configuration YAML");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  cwlstage --base-dir /data/run1 inputs request.yaml inputs.yml");
    println!("  cwlstage archive prov/execution_create.zip prov");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Result<Config, EarlyExit>, String> {
    let mut config = Config {
        command: None,
        config_path: None,
        base_dir: None,
        verbose: false,
    };
    let mut positional: Vec<String> = Vec::new();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => return Ok(Err(EarlyExit::Help)),
            "--version" | "-V" => return Ok(Err(EarlyExit::Version)),
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--base-dir" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err(format!("{} requires a path argument", arg));
                }
                let path = PathBuf::from(&args[i]);
                if arg == "--base-dir" {
                    config.base_dir = Some(path);
                } else {
                    config.config_path = Some(path);
                }
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => positional.push(arg.clone()),
        }
        i += 1;
    }

    config.command = Some(parse_command(&positional)?);
    Ok(Ok(config))
}

/// Builds the command from positional arguments.
fn parse_command(positional: &[String]) -> Result<Command, String> {
    let Some((name, rest)) = positional.split_first() else {
        return Err("Missing command".to_string());
    };

    let expect = |count: usize, usage: &str| -> Result<(), String> {
        if rest.len() == count {
            Ok(())
        } else {
            Err(format!("Usage: cwlstage {} {}", name, usage))
        }
    };

    match name.as_str() {
        "inputs" => {
            expect(2, "<REQUEST> <TARGET>")?;
            Ok(Command::Inputs {
                request: PathBuf::from(&rest[0]),
                target: PathBuf::from(&rest[1]),
            })
        }
        "outputs" => {
            expect(3, "<SPECS> <RESULTS> <PROVENANCE_DIR>")?;
            Ok(Command::Outputs {
                specs: PathBuf::from(&rest[0]),
                results: PathBuf::from(&rest[1]),
                provenance: PathBuf::from(&rest[2]),
            })
        }
        "archive" => {
            expect(2, "<TARGET> <PROVENANCE_DIR>")?;
            Ok(Command::Archive {
                target: PathBuf::from(&rest[0]),
                provenance: PathBuf::from(&rest[1]),
            })
        }
        "crate" => {
            expect(3, "<WORKFLOW_URL> <BINDINGS> <TARGET>")?;
            Ok(Command::Crate {
                workflow_url: rest[0].clone(),
                bindings: PathBuf::from(&rest[1]),
                target: PathBuf::from(&rest[2]),
            })
        }
        other => Err(format!("Unknown command: {}", other)),
    }
}

/// Resolves the workflow base directory, defaulting to the current one.
fn setup_base_directory(base_dir: Option<PathBuf>) -> Result<PathBuf, Box<dyn Error>> {
    let Some(dir) = base_dir else {
        let current = env::current_dir()?;
        info!("Base directory: {}", current.display());
        return Ok(current);
    };

    if !dir.is_dir() {
        return Err(format!("Base directory does not exist: {}", dir.display()).into());
    }

    let dir = fs::canonicalize(&dir)?;
    info!("Base directory: {}", dir.display());
    Ok(dir)
}

/// Reads and parses a YAML (or JSON) document from `path`.
fn read_document<T: serde::de::DeserializeOwned>(
    path: &Path,
    what: &str,
) -> Result<T, Box<dyn Error>> {
    let content = fs::read_to_string(path).map_err(|e| {
        format!("Failed to read {} '{}': {}", what, path.display(), e)
    })?;

    let document = serde_yaml::from_str(&content).map_err(|e| {
        format!("Failed to parse {} '{}': {}", what, path.display(), e)
    })?;

    Ok(document)
}

/// Runs the selected command.
fn execute(workflow: &Workflow, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Inputs { request, target } => {
            let request: StagingRequest = read_document(&request, "staging request")?;
            let document = workflow.create_bindings(&request, &target)?;
            info!("{} execution inputs written to {}", document.len(), target.display());
        }
        Command::Outputs {
            specs,
            results,
            provenance,
        } => {
            let specs: Vec<OutputSpec> = read_document(&specs, "output specs")?;
            let content = fs::read_to_string(&results).map_err(|e| {
                format!("Failed to read execution results '{}': {}", results.display(), e)
            })?;
            let results = workflow.parse_results(&content)?;

            let resolved = workflow.resolve_outputs(&specs, &results, &provenance)?;
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Command::Archive { target, provenance } => {
            if let Err(e) = workflow.compress_provenance(&target, &provenance) {
                if let Some(code) = exit_code_for(&e) {
                    error!("{}", e);
                    eprintln!("Fatal: {}", e);
                    std::process::exit(code);
                }
                return Err(e.into());
            }
            info!("Provenance archive: {}", target.display());
        }
        Command::Crate {
            workflow_url,
            bindings,
            target,
        } => {
            let document: BindingDocument = read_document(&bindings, "binding document")?;
            workflow.create_crate(RoCrateBuilder, &workflow_url, &document, &target)?;
        }
    }

    Ok(())
}

/// Process exit code for archive failures that must stop the run outright.
fn exit_code_for(err: &ArchiveError) -> Option<i32> {
    if err.is_fatal() {
        Some(FATAL_EXIT_CODE)
    } else {
        None
    }
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();

    let config = match parse_arguments(&args) {
        Ok(Ok(config)) => config,
        Ok(Err(EarlyExit::Help)) => {
            print_usage();
            return Ok(());
        }
        Ok(Err(EarlyExit::Version)) => {
            println!("{} {}", APP_NAME, VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return Err(e.into());
        }
    };

    setup_logging(config.verbose);

    let staging_config = match config.config_path {
        Some(ref path) => load_config(path)?,
        None => StagingConfig::default(),
    };

    let base_dir = setup_base_directory(config.base_dir)?;
    let workflow = Workflow::new(base_dir, staging_config, LogReporter::shared());

    match config.command {
        Some(command) => execute(&workflow, command),
        None => Err("Missing command".into()),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
