//! Spigot CLI - stream exact digits of real numbers.
//!
//! Every digit is printed as soon as it is certain, so the output can be
//! piped, truncated or interrupted at any point without losing correctness.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use spigot_core::SpigotError;
use tracing::{debug, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

mod commands;
mod config;

use commands::config as config_cmd;
use commands::run::{OutputMode, RunOptions};
use config::Config;

/// Spigot - exact, streaming digits of real numbers.
///
/// Evaluate a prefix expression such as `pi`, `root 2`, `add pi e` or
/// `frac -7 2` and print its digits, continued fraction terms, convergents
/// or rational approximations. Options go before the expression.
#[derive(Parser, Debug)]
#[command(
    name = "spigot",
    author,
    version,
    about = "Spigot: exact, streaming digits of real numbers",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(flatten)]
    mode: ModeArgs,

    /// Stop after this many digits (the integer part counts as one).
    #[arg(short, long, value_name = "DIGITS")]
    digits: Option<u64>,

    /// Keep printing zeros after a terminating expansion.
    #[arg(short = 'n', long)]
    no_early_terminate: bool,

    /// Expression to evaluate, e.g. `mul root 2 pi`. See `spigot sources`.
    #[arg(
        value_name = "EXPR",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    expression: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format; at most one may be given.
#[derive(Args, Debug)]
#[group(multiple = false)]
struct ModeArgs {
    /// Output digits in this base (2-36).
    #[arg(short, long, value_name = "BASE", value_parser = clap::value_parser!(u32).range(2..=36))]
    base: Option<u32>,

    /// Output continued fraction terms, one per line.
    #[arg(short, long)]
    cfrac: bool,

    /// Output continued fraction convergents as p/q.
    #[arg(short = 'C', long)]
    convergents: bool,

    /// Read denominators D from stdin and print floor(D * x) for each.
    #[arg(short, long)]
    approx: bool,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the sources and operators usable in expressions.
    Sources,

    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,
        /// Configuration value.
        value: String,
    },

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Reset configuration to defaults.
    Reset,

    /// Show path to config file.
    Path,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing based on verbosity; stdout is reserved for digits
    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN // Default to less noise
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if is_broken_pipe(&err) => {
            debug!("output_closed");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(mut cli: Cli) -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    match cli.command.take() {
        Some(Commands::Sources) => commands::sources::execute(),

        Some(Commands::Config(config_cmd_inner)) => {
            let mut config = config;
            match config_cmd_inner {
                ConfigCommands::Show => config_cmd::show(&config),
                ConfigCommands::Set { key, value } => config_cmd::set(&mut config, &key, &value),
                ConfigCommands::Get { key } => config_cmd::get(&config, &key),
                ConfigCommands::Reset => config_cmd::reset(),
                ConfigCommands::Path => config_cmd::path(),
            }
        }

        None => {
            if cli.expression.is_empty() {
                Cli::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "an expression is required (try `spigot pi` or `spigot sources`)",
                    )
                    .exit();
            }

            let options = resolve_options(&cli, &config);
            debug!(?options, "run_options");

            // Interrupting a stream is a normal way to stop it
            ctrlc::set_handler(|| std::process::exit(0))
                .context("Failed to install Ctrl-C handler")?;

            commands::run::execute(&cli.expression, &options)?;
            Ok(())
        }
    }
}

/// Combine command-line flags with the loaded configuration.
fn resolve_options(cli: &Cli, config: &Config) -> RunOptions {
    let mode = if cli.mode.cfrac {
        OutputMode::ContinuedFraction
    } else if cli.mode.convergents {
        OutputMode::Convergents
    } else if cli.mode.approx {
        OutputMode::Approximation
    } else {
        OutputMode::Base(cli.mode.base.unwrap_or(config.base))
    };

    RunOptions {
        mode,
        limit: cli.digits.or(config.digits),
        early_terminate: config.early_terminate && !cli.no_early_terminate,
    }
}

/// Check whether the error chain bottoms out in a closed pipe.
fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<SpigotError>()
            .is_some_and(SpigotError::is_broken_pipe)
            || cause
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("spigot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_arguments_stay_in_expression() {
        let cli = parse(&["-d", "5", "frac", "-7", "2"]);
        assert_eq!(cli.expression, vec!["frac", "-7", "2"]);
        assert_eq!(cli.digits, Some(5));
    }

    #[test]
    fn test_modes_are_exclusive() {
        let result = Cli::try_parse_from(["spigot", "-c", "-C", "pi"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_options_precedence() {
        let config = Config {
            base: 16,
            digits: Some(40),
            early_terminate: true,
        };

        let options = resolve_options(&parse(&["pi"]), &config);
        assert_eq!(options.mode, OutputMode::Base(16));
        assert_eq!(options.limit, Some(40));
        assert!(options.early_terminate);

        let options = resolve_options(&parse(&["-b", "2", "-d", "8", "-n", "pi"]), &config);
        assert_eq!(options.mode, OutputMode::Base(2));
        assert_eq!(options.limit, Some(8));
        assert!(!options.early_terminate);

        let options = resolve_options(&parse(&["-C", "pi"]), &config);
        assert_eq!(options.mode, OutputMode::Convergents);
    }

    #[test]
    fn test_subcommands_parse() {
        assert!(matches!(parse(&["sources"]).command, Some(Commands::Sources)));
        assert!(matches!(
            parse(&["config", "get", "base"]).command,
            Some(Commands::Config(ConfigCommands::Get { .. }))
        ));
    }

    #[test]
    fn test_broken_pipe_detection() {
        let err = anyhow::Error::from(SpigotError::from(io::Error::from(
            io::ErrorKind::BrokenPipe,
        )))
        .context("writing digits");
        assert!(is_broken_pipe(&err));
        assert!(!is_broken_pipe(&anyhow::anyhow!("bad expression")));
    }
}
