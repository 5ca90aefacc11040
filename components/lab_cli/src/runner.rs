//! Scenario execution and trace printing
//!
//! [`run`] turns parsed arguments into a selection of scenarios and drives a
//! [`Runner`] over them. Every scenario gets a fresh [`Lab`], so nothing one
//! scenario queues can leak into the next.

use crate::cli::Cli;
use crate::error::{CliError, CliResult};
use async_runtime::{Stream, TraceLine};
use scenarios::{by_chapter, catalog, find, Chapter, Lab, Scenario, DEFAULT_SEED};
use std::io::Write;
use tracing::{debug, info};

/// Outcome of a run over one or more scenarios.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Scenarios executed
    pub ran: usize,
    /// Scenarios that ended with an uncaught exception
    pub uncaught: usize,
}

impl RunSummary {
    /// Process exit status: 1 if any scenario ended uncaught, 0 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.uncaught > 0 {
            1
        } else {
            0
        }
    }
}

/// Runs scenarios and prints their traces
#[derive(Debug, Clone)]
pub struct Runner {
    /// Seed for simulated latency
    seed: u64,
    /// Whether to print JSON lines instead of text
    json: bool,
    /// Whether to prefix text lines with virtual time
    timestamps: bool,
}

impl Runner {
    /// Create a runner with the default seed and plain text output
    ///
    /// # Example
    /// ```
    /// use lab_cli::Runner;
    ///
    /// let runner = Runner::new().with_seed(7).with_timestamps(true);
    /// ```
    pub fn new() -> Self {
        Self {
            seed: DEFAULT_SEED,
            json: false,
            timestamps: false,
        }
    }

    /// Set the latency seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable JSON lines output
    pub fn with_json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    /// Enable virtual-time prefixes
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// Run one scenario on a fresh lab and print its trace
    ///
    /// Text output sends stdout lines to `out` and diagnostics to `err`. JSON
    /// output writes every line to `out`; each carries its stream.
    ///
    /// # Errors
    /// Returns `CliError::Runtime` if the scenario ended with an uncaught
    /// exception. Its trace, including the report, is printed first.
    pub fn run_scenario<O, E>(&self, scenario: &Scenario, out: &mut O, err: &mut E) -> CliResult<()>
    where
        O: Write,
        E: Write,
    {
        debug!(scenario = scenario.name, seed = self.seed, "starting scenario");
        let lab = Lab::new(self.seed);
        let result = scenario.execute(&lab);
        for line in lab.trace() {
            self.print_line(&line, out, err)?;
        }
        if let Err(ref failure) = result {
            info!(scenario = scenario.name, error = %failure, "scenario ended uncaught");
        }
        result.map_err(CliError::from)
    }

    /// Run scenarios in order, each on its own lab
    ///
    /// A banner naming each scenario precedes its trace when more than one is
    /// run in text mode. An uncaught exception ends only the scenario it
    /// happened in.
    pub fn run_all<O, E>(
        &self,
        selection: &[&Scenario],
        out: &mut O,
        err: &mut E,
    ) -> CliResult<RunSummary>
    where
        O: Write,
        E: Write,
    {
        let mut summary = RunSummary::default();
        let banners = selection.len() > 1 && !self.json;
        for (i, scenario) in selection.iter().enumerate() {
            if banners {
                if i > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "=== {} ===", scenario.name)?;
                out.flush()?;
            }
            summary.ran += 1;
            match self.run_scenario(scenario, out, err) {
                Ok(()) => {}
                Err(CliError::Runtime(_)) => summary.uncaught += 1,
                Err(other) => return Err(other),
            }
        }
        Ok(summary)
    }

    fn print_line<O, E>(&self, line: &TraceLine, out: &mut O, err: &mut E) -> CliResult<()>
    where
        O: Write,
        E: Write,
    {
        if self.json {
            writeln!(out, "{}", serde_json::to_string(line)?)?;
            return Ok(());
        }
        let text = if self.timestamps {
            format!("[{:>5}ms] {}", line.at_ms, line.text)
        } else {
            line.text.clone()
        };
        match line.stream {
            Stream::Stdout => writeln!(out, "{}", text)?,
            Stream::Stderr => {
                // Keep stdout and stderr interleaved in trace order.
                out.flush()?;
                writeln!(err, "{}", text)?;
                err.flush()?;
            }
        }
        Ok(())
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the catalog grouped by chapter
pub fn list<O: Write>(out: &mut O) -> CliResult<()> {
    let width = catalog().iter().map(|s| s.name.len()).max().unwrap_or(0);
    for (i, chapter) in Chapter::ALL.into_iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{}", chapter)?;
        for scenario in by_chapter(chapter) {
            writeln!(out, "  {:<width$}  {}", scenario.name, scenario.summary)?;
        }
    }
    Ok(())
}

/// Resolve the scenarios the arguments name
///
/// # Errors
/// Returns a usage error for an unknown chapter or scenario name.
pub fn select(cli: &Cli) -> CliResult<Vec<&'static Scenario>> {
    if let Some(name) = &cli.chapter {
        let chapter: Chapter = name.parse().map_err(|_| {
            let known: Vec<_> = Chapter::ALL.iter().map(|c| c.name()).collect();
            CliError::UnknownChapter(name.clone(), known.join(", "))
        })?;
        return Ok(by_chapter(chapter).collect());
    }
    cli.scenarios
        .iter()
        .map(|name| find(name).ok_or_else(|| CliError::UnknownScenario(name.clone())))
        .collect()
}

/// Execute the command the arguments describe
///
/// With no scenario and no chapter the catalog is listed.
pub fn run<O, E>(cli: &Cli, out: &mut O, err: &mut E) -> CliResult<RunSummary>
where
    O: Write,
    E: Write,
{
    if cli.list || (cli.scenarios.is_empty() && cli.chapter.is_none()) {
        list(out)?;
        return Ok(RunSummary::default());
    }
    let selection = select(cli)?;
    Runner::new()
        .with_seed(cli.seed)
        .with_json(cli.json)
        .with_timestamps(cli.timestamps)
        .run_all(&selection, out, err)
}
