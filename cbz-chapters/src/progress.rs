use std::io::{self, Write};

use indicatif::{ProgressBar, ProgressStyle};

/// 40 cells, each one standing for 2.5% of the work
static BAR_TEMPLATE: &str = "{msg} [{bar:40}]";

/// Receives "N of M complete" events from the pipeline.
///
/// Reporting is best effort: implementations must never fail or panic,
/// whatever happens to the terminal.
pub trait Progress {
    fn start(&mut self, title: &str, total: usize);

    fn advance(&mut self, done: usize);

    fn finish(&mut self);

    /// A one-off line such as `[EXTRACTING] Series/Series v1.cbz`
    fn status(&mut self, tag: &str, message: &str);
}

/// Draws a 40 cells `#`/`-` bar on the terminal
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
}

impl ConsoleProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for ConsoleProgress {
    fn start(&mut self, title: &str, total: usize) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }

        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .map(|style| style.progress_chars("#-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::new(total as u64)
            .with_style(style)
            .with_message(title.to_string());

        if total == 0 {
            bar.finish();
        } else {
            bar.tick();
            self.bar = Some(bar);
        }
    }

    fn advance(&mut self, done: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(done as u64);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.set_position(bar.length().unwrap_or_default());
            bar.finish();
        }
    }

    fn status(&mut self, tag: &str, message: &str) {
        let line = format!("[{tag}] {message}");
        match &self.bar {
            Some(bar) => bar.println(line),
            None => {
                let _ = writeln!(io::stdout().lock(), "{line}");
            }
        }
    }
}

/// Swallows every event, for `--no-progress` and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn start(&mut self, _title: &str, _total: usize) {}

    fn advance(&mut self, _done: usize) {}

    fn finish(&mut self) {}

    fn status(&mut self, _tag: &str, _message: &str) {}
}
