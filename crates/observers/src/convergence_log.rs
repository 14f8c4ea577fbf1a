use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tandem_core::{Observer, as_seconds};
use tandem_driver::subcycling::{Action, Event, Solution};

/// Appends one line per accepted step to `<name>.log`.
///
/// Columns are `step time dt newton_iterations sub_iterations`. Rollbacks
/// leave no line; their total appears in the summary written by [`finish`].
///
/// [`finish`]: ConvergenceLog::finish
#[derive(Debug)]
pub struct ConvergenceLog {
    path: PathBuf,
    writer: BufWriter<File>,
    failed: bool,
}

impl ConvergenceLog {
    /// Opens `<directory>/<name>.log` for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn append(directory: impl AsRef<Path>, name: &str) -> io::Result<Self> {
        let path = directory.as_ref().join(format!("{name}.log"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "# step time dt newton_iterations sub_iterations")?;

        Ok(Self {
            path,
            writer,
            failed: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the run summary and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(mut self, solution: &Solution) -> io::Result<()> {
        writeln!(
            self.writer,
            "# {:?}: {} accepted steps, {} rollbacks, {} newton solves, final time {}",
            solution.status,
            solution.accepted_steps,
            solution.rollbacks,
            solution.newton_solves,
            as_seconds(solution.final_time)
        )?;
        self.writer.flush()
    }

    fn record(&mut self, event: &Event) -> io::Result<()> {
        match *event {
            Event::Accepted {
                step,
                time,
                dt,
                newton_iterations,
                sub_iterations,
            } => writeln!(
                self.writer,
                "{step} {} {} {newton_iterations} {sub_iterations}",
                as_seconds(time),
                dt.seconds()
            ),
            Event::RolledBack { .. } => Ok(()),
        }
    }
}

impl Observer<Event, Action> for ConvergenceLog {
    fn observe(&mut self, event: &Event) -> Option<Action> {
        if !self.failed {
            if let Err(err) = self.record(event) {
                tracing::warn!(path = %self.path.display(), %err, "convergence log disabled");
                self.failed = true;
            }
        }
        None
    }
}
