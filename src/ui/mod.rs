//! Progress reporting
//!
//! The converter reports through the `Ui` trait:
//! - `ConsoleUi` prints each processed member above an indicatif progress bar
//! - `SilentUi` discards everything (tests, library use)

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Stdout, Write};

/// Trait for UI implementations - allows both console and silent/test modes
pub trait Ui {
    fn set_info(&mut self, info: impl Into<String>);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);
}

/// Console output with a progress bar over the archive members.
///
/// Messages go to `out` (stdout by default) while the bar draws on stderr,
/// so they are kept even when stderr is not a terminal and the bar is hidden.
pub struct ConsoleUi<W: Write = Stdout> {
    bar: Option<ProgressBar>,
    out: W,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ConsoleUi {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleUi<W> {
    pub fn with_writer(out: W) -> Self {
        Self { bar: None, out }
    }

    pub fn into_writer(self) -> W {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        self.out
    }

    fn bar(&mut self, total: u64) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            let style = ProgressStyle::with_template("{msg:30} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-");
            let bar = ProgressBar::new(total);
            bar.set_style(style);
            bar
        })
    }
}

impl<W: Write> Ui for ConsoleUi<W> {
    fn set_info(&mut self, info: impl Into<String>) {
        self.log(info);
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        let bar = self.bar(total);
        bar.set_length(total);
        bar.set_position(current);
        bar.set_message(label.into());
    }

    fn clear_progress(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        let Self { bar, out } = self;
        let written = match bar {
            Some(bar) => bar.suspend(|| writeln!(out, "{}", message)),
            None => writeln!(out, "{}", message),
        };
        if let Err(e) = written {
            log::debug!("Failed to write progress message: {}", e);
        }
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_info(&mut self, _info: impl Into<String>) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}
