//! # bc
//!
//! An arbitrary precision calculator language.
//!

use bc::mach::{Config, Portability};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod term;

#[derive(Parser, Debug)]
#[command(name = "bc", version)]
#[command(about = "An arbitrary precision calculator language")]
struct Cli {
    /// Files to run before reading standard input
    files: Vec<PathBuf>,

    /// Treat non-POSIX constructs as errors
    #[arg(short, long)]
    standard: bool,

    /// Warn about non-POSIX constructs
    #[arg(short, long)]
    warn: bool,

    /// Print compiled code instead of running it
    #[arg(short, long)]
    compile: bool,

    /// Do not print the welcome banner
    #[arg(short, long)]
    quiet: bool,

    /// Force interactive mode
    #[arg(short, long)]
    interactive: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let portability = if cli.standard {
        Portability::Error
    } else if cli.warn {
        Portability::Warn
    } else {
        Portability::Ignore
    };
    let config = Config::new()
        .portability(portability)
        .compile_only(cli.compile);
    let options = term::Options {
        files: cli.files,
        interactive: cli.interactive || std::io::stdin().is_terminal(),
        quiet: cli.quiet,
    };
    std::process::exit(term::main(config, options));
}
