//! Run orchestration.
//!
//! For each resolved input the orchestrator opens the container, attaches
//! the writer, filters the classes by name and renders every match through
//! the [`OutputRouter`]. [`run`] wraps argument scanning and processing in a
//! [`RunContext`] so temporary extractions are deleted on every exit path.

use crate::args::ArgumentParser;
use crate::config::ResolvedConfig;
use crate::context::RunContext;
use crate::dex::Dex;
use crate::error::{Error, Result};
use crate::input::InputEntry;
use crate::output::{OutputMode, OutputRouter};
use crate::pattern::ClassPattern;
use crate::writer::{DexWriter, WriterRegistry};
use std::io::Write;
use tracing::{debug, info, trace, warn};

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Inputs processed to completion
    pub inputs_processed: usize,
    /// Inputs skipped because of a per-input error
    pub inputs_skipped: usize,
    /// Classes rendered
    pub classes_written: usize,
}

/// Drives one writer over a list of inputs
#[derive(Debug)]
pub struct Orchestrator {
    config: ResolvedConfig,
    pattern: ClassPattern,
    writer: Box<dyn DexWriter>,
}

impl Orchestrator {
    /// Compiles the class pattern and creates the configured writer
    pub fn new(config: ResolvedConfig, registry: &WriterRegistry) -> Result<Self> {
        let pattern = config.compile_pattern()?;
        let writer = match config.writer {
            Some(name) => registry.create(name)?,
            None => registry.create_default()?,
        };
        debug!(
            "Using writer {} with pattern '{}' and options {}",
            writer.name(),
            pattern.as_str(),
            config.display_options
        );
        Ok(Self {
            config,
            pattern,
            writer,
        })
    }

    /// Name of the active writer
    pub fn writer_name(&self) -> &'static str {
        self.writer.name()
    }

    /// Processes every input in order.
    ///
    /// Per-input errors are logged and the input is skipped; any other error
    /// stops the run.
    pub fn process<W: Write>(&mut self, inputs: &[InputEntry], console: W) -> Result<RunSummary> {
        let mut router = OutputRouter::new(OutputMode::from(&self.config), console);
        let mut summary = RunSummary::default();

        for input in inputs {
            match self.process_input(input, &mut router) {
                Ok(written) => {
                    summary.inputs_processed += 1;
                    summary.classes_written += written;
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping {}: {}", input.display_name(), e);
                    summary.inputs_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        router.flush()?;
        Ok(summary)
    }

    fn process_input<W: Write>(
        &mut self,
        input: &InputEntry,
        router: &mut OutputRouter<W>,
    ) -> Result<usize> {
        debug!(
            "Processing {} from {}",
            input.display_name(),
            input.path().display()
        );

        let dex = Dex::open(input.path())?;
        self.writer.attach(&dex);
        router.begin_input(input.display_name());

        let mut written = 0;
        for class in dex.classes() {
            let class = class?;
            if !self.pattern.is_match(class.name()) {
                trace!("Skipping class {}", class.name());
                continue;
            }

            let resolved = class.load()?;
            let mut destination = router.destination(class.name(), self.writer.extension())?;
            let label = destination.label();
            self.writer
                .write_class(&resolved, &self.config.display_options, &mut destination)
                .map_err(|e| Error::file_write(label, e))?;
            destination.finish()?;
            written += 1;
        }

        debug!("{}: {} classes written", input.display_name(), written);
        Ok(written)
    }
}

/// Scans `args`, processes the inputs and deletes temporary files
pub fn run<I, S, W>(args: I, registry: &WriterRegistry, console: W) -> Result<RunSummary>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    W: Write,
{
    run_with(RunContext::new(), args, registry, console)
}

/// Like [`run`], with an explicit context
pub fn run_with<I, S, W>(
    mut ctx: RunContext,
    args: I,
    registry: &WriterRegistry,
    console: W,
) -> Result<RunSummary>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    W: Write,
{
    let result = execute(&mut ctx, args, registry, console);
    let removed = ctx.cleanup();
    if removed > 0 {
        debug!("Removed {} temporary file(s)", removed);
    }

    if let Ok(summary) = &result {
        info!(
            "Summary: {} inputs processed, {} skipped, {} classes written",
            summary.inputs_processed, summary.inputs_skipped, summary.classes_written
        );
    }
    result
}

fn execute<I, S, W>(
    ctx: &mut RunContext,
    args: I,
    registry: &WriterRegistry,
    console: W,
) -> Result<RunSummary>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    W: Write,
{
    let parsed = ArgumentParser::new(registry, ctx).parse(args)?;
    let mut orchestrator = Orchestrator::new(parsed.config, registry)?;
    orchestrator.process(&parsed.inputs, console)
}
