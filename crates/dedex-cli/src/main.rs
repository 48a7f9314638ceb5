//! dedex - Dump classes from Dalvik executables and Android packages
//!
//! Every `.dex` argument is read in place; every `.apk` argument has its
//! `classes.dex` extracted to a temporary file first. Matching classes are
//! rendered to stdout, or to one file per class with `-o`.

use anyhow::Result;
use clap::Parser;
use dedex_core::{run, usage, Error, WriterRegistry};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Dump classes from Dalvik executables and Android packages
#[derive(Parser, Debug)]
#[command(name = "dedex")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Options: -c <pattern>, -d <display[,display...]>, -o <directory>, -w <language>")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Options and input files, scanned in order
    #[arg(
        value_name = "ARGS",
        allow_hyphen_values = true,
        trailing_var_arg = true
    )]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let registry = WriterRegistry::default();
    match try_main(&cli, &registry) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = report_failure(&e, &registry, &mut io::stdout(), &mut io::stderr());
            ExitCode::FAILURE
        }
    }
}

/// Prints usage when nothing was given to process, the error chain otherwise
fn report_failure(
    err: &anyhow::Error,
    registry: &WriterRegistry,
    out: &mut impl Write,
    err_out: &mut impl Write,
) -> io::Result<()> {
    if matches!(err.downcast_ref::<Error>(), Some(Error::NoInputs)) {
        write!(out, "{}", usage(registry))?;
        out.flush()
    } else {
        writeln!(err_out, "{:#}", err)
    }
}

fn try_main(cli: &Cli, registry: &WriterRegistry) -> Result<()> {
    debug!("Arguments: {:?}", cli.args);

    let stdout = io::stdout();
    let summary = run(&cli.args, registry, stdout.lock())?;

    info!(
        "Done: {} classes from {} inputs",
        summary.classes_written, summary.inputs_processed
    );
    Ok(())
}
