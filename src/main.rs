//! cwl-dummy CLI Entry Point
//!
//! # Usage
//!
//! ```bash
//! # Convert a workflow and every tool it references
//! cwl-dummy pipeline.cwl
//!
//! # Regenerate existing dummies, keep going past broken steps
//! cwl-dummy --force --keep-going pipeline.cwl
//!
//! # Make every dummy tool take ten seconds
//! cwl-dummy --delay 10 pipeline.cwl
//!
//! # Show what would be generated
//! cwl-dummy --dry-run tools/*.cwl
//! ```

use std::env;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use cwl_dummy::emit::DEFAULT_SUFFIX;
use cwl_dummy::{ConversionReport, ConvertOptions, Converter, Outcome, APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    files: Vec<String>,
    options: ConvertOptions,
    verbose: bool,
}

/// What the command line asks for.
#[derive(Debug)]
enum Command {
    Convert(Config),
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
    println!("Usage: cwl-dummy [OPTIONS] <FILE>...");
    println!();
    println!("Writes <FILE><SUFFIX> next to each CWL document (and every document it");
    println!("references) with the same interface, whose tools only create their outputs.");
    println!();
    println!("Options:");
    println!("  -f, --force          Overwrite existing dummy files");
    println!("  -k, --keep-going     Keep converting sibling steps after a failure");
    println!("      --suffix SUFFIX  Suffix for generated files (default: {})", DEFAULT_SUFFIX);
    println!("      --delay SECONDS  Make dummy tools sleep before creating outputs");
    println!("      --dry-run        Transform without writing files");
    println!("  -v, --verbose        Enable debug logging");
    println!("  -h, --help           Show this help message");
    println!("  -V, --version        Show version information");
}

/// Parses command-line arguments into a [`Command`].
fn parse_arguments(args: &[String]) -> Result<Command, String> {
    let mut config = Config::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--force" | "-f" => config.options.force = true,
            "--keep-going" | "-k" => config.options.keep_going = true,
            "--dry-run" => config.options.dry_run = true,
            "--verbose" | "-v" => config.verbose = true,
            "--suffix" => {
                i += 1;
                let suffix = args.get(i).ok_or("--suffix requires a value")?;
                if suffix.is_empty() || suffix.contains('/') {
                    return Err(format!("Invalid suffix: '{}'", suffix));
                }
                config.options.suffix = suffix.clone();
            }
            "--delay" => {
                i += 1;
                let delay = args.get(i).ok_or("--delay requires a number of seconds")?;
                config.options.delay = delay
                    .parse()
                    .map_err(|_| format!("Invalid delay value: {}", delay))?;
            }
            "--" => {
                config.files.extend(args[i + 1..].iter().cloned());
                break;
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => config.files.push(arg.clone()),
        }
        i += 1;
    }

    if config.files.is_empty() {
        return Err("No input files given".to_string());
    }
    Ok(Command::Convert(config))
}

/// Prints per-document failures and the run totals.
fn print_summary(report: &ConversionReport) {
    println!();
    for outcome in report.get_outcomes() {
        if outcome.outcome == Outcome::Failed {
            let detail = outcome.detail.as_deref().unwrap_or("failed");
            println!("  {} {}", "FAILED".red().bold(), detail);
        }
    }

    let summary = report.summary();
    if report.has_failures() {
        println!("{}", summary.red());
    } else if !report.get_warnings().is_empty() {
        println!("{}", summary.yellow());
    } else {
        println!("{}", summary.green());
    }
}

/// Main application entry point. Returns whether every file converted.
fn run(config: Config) -> bool {
    setup_logging(config.verbose);

    if config.options.dry_run {
        info!("Mode: DRY RUN (no files will be written)");
    }

    let mut converter = Converter::new(config.options);
    let mut ok = true;

    for file in &config.files {
        match converter.convert(file) {
            Ok(path) => info!("{} -> {}", file, path.display()),
            Err(e) => {
                error!("{}", e);
                ok = false;
            }
        }
    }

    print_summary(converter.report());
    ok
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match parse_arguments(&args) {
        Ok(Command::Help) => {
            print_usage();
            ExitCode::SUCCESS
        }
        Ok(Command::Version) => {
            println!("{} {}", APP_NAME, VERSION);
            ExitCode::SUCCESS
        }
        Ok(Command::Convert(config)) => {
            if run(config) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("cwl-dummy")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    fn config(list: &[&str]) -> Config {
        match parse_arguments(&args(list)).unwrap() {
            Command::Convert(config) => config,
            other => panic!("expected a conversion, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let config = config(&["wf.cwl"]);
        assert_eq!(config.files, vec!["wf.cwl"]);
        assert_eq!(config.options, ConvertOptions::default());
        assert!(!config.verbose);
    }

    #[test]
    fn test_flags() {
        let config = config(&["-f", "-k", "--dry-run", "-v", "--suffix", ".fake", "--delay", "3", "a.cwl", "b.cwl"]);
        assert!(config.options.force);
        assert!(config.options.keep_going);
        assert!(config.options.dry_run);
        assert!(config.verbose);
        assert_eq!(config.options.suffix, ".fake");
        assert_eq!(config.options.delay, 3);
        assert_eq!(config.files, vec!["a.cwl", "b.cwl"]);
    }

    #[test]
    fn test_double_dash_ends_options() {
        let config = config(&["--", "-odd.cwl"]);
        assert_eq!(config.files, vec!["-odd.cwl"]);
    }

    #[test]
    fn test_help_and_version() {
        assert!(matches!(parse_arguments(&args(&["wf.cwl", "--help"])), Ok(Command::Help)));
        assert!(matches!(parse_arguments(&args(&["-V"])), Ok(Command::Version)));
    }

    #[test]
    fn test_errors() {
        assert!(parse_arguments(&args(&[])).is_err());
        assert!(parse_arguments(&args(&["--delay", "soon", "wf.cwl"])).is_err());
        assert!(parse_arguments(&args(&["wf.cwl", "--suffix"])).is_err());
        assert!(parse_arguments(&args(&["--suffix", "a/b", "wf.cwl"])).is_err());
        assert!(parse_arguments(&args(&["--parallel", "4", "wf.cwl"])).is_err());
    }
}
