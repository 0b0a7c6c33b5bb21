//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use std::cell::RefCell;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` shows a spinner on a TTY, or prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ! {message}"`
///
/// Everything is suppressed when `ctx.quiet` or when the reporter is silent
/// (JSON mode keeps stdout for the result document).
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    silent: bool,
    active: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            silent: false,
            active: RefCell::new(None),
        }
    }

    /// A reporter that emits nothing.
    #[must_use]
    pub fn silent(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            silent: true,
            active: RefCell::new(None),
        }
    }

    fn enabled(&self) -> bool {
        !self.silent && !self.ctx.quiet
    }

    /// Close the running spinner, if any. Returns `true` if one was open.
    fn settle(&self, finish: impl FnOnce(&ProgressBar)) -> bool {
        match self.active.borrow_mut().take() {
            Some(pb) => {
                finish(&pb);
                true
            }
            None => false,
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if !self.enabled() {
            return;
        }
        self.settle(progress::finish_step);
        if self.ctx.show_progress() {
            *self.active.borrow_mut() = Some(progress::spinner(message));
        } else {
            println!("  {} {message}", "→".style(self.ctx.styles.info));
        }
    }

    fn success(&self, message: &str) {
        if !self.enabled() {
            return;
        }
        if !self.settle(|pb| progress::finish_ok(pb, message)) {
            println!("  {} {message}", "✓".style(self.ctx.styles.success));
        }
    }

    fn warn(&self, message: &str) {
        if !self.enabled() {
            return;
        }
        self.settle(progress::finish_step);
        println!("  {} {message}", "!".style(self.ctx.styles.warning));
    }

    fn pause(&self) {
        self.settle(progress::finish_step);
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        if let Some(pb) = self.active.get_mut().take() {
            progress::finish_step(&pb);
        }
    }
}
