use std::io::Write;
use tracing::debug;

/// Console feedback for per-item work.
///
/// Verbose runs log each item at debug level; terse runs print one dot per
/// item and a line break when the stage is done.
#[derive(Debug)]
pub struct Progress {
    verbose: bool,
    ticks: usize,
}

impl Progress {
    pub fn new(verbose: bool) -> Self {
        Self { verbose, ticks: 0 }
    }

    /// Record one processed item
    pub fn item(&mut self, detail: impl FnOnce() -> String) {
        self.ticks += 1;
        if self.verbose {
            debug!("{}", detail());
        } else {
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, ".");
            let _ = stdout.flush();
        }
    }

    /// End the current line of dots
    pub fn finish(&mut self) {
        if !self.verbose && self.ticks > 0 {
            println!();
        }
        self.ticks = 0;
    }

    #[cfg(test)]
    fn count(&self) -> usize {
        self.ticks
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.finish();
    }
}
