//! Per-mailbox progress bars.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Shared container for the bars of all running mailboxes.
#[derive(Clone)]
pub struct Progress {
    multi: MultiProgress,
}

impl Progress {
    /// Bars drawn to stderr.
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    /// Bars that are tracked but never drawn (tests, `--json` runs).
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }

    /// Start a bar for one mailbox. The bar is finished when the returned
    /// handle is dropped.
    pub fn mailbox(&self, worker: usize, name: &str) -> MailboxProgress {
        let bar = self.multi.add(ProgressBar::new(0));
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos}/{len} emails ({eta})",
                )
                .expect("valid template")
                .progress_chars("#>-"),
        );
        bar.set_prefix(format!("[Worker {worker}] {name}"));
        MailboxProgress { bar }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress of a single mailbox.
pub struct MailboxProgress {
    bar: ProgressBar,
}

impl MailboxProgress {
    pub fn set_total(&self, total: u64) {
        self.bar.set_length(total);
    }

    /// Count one visited item.
    pub fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Drop for MailboxProgress {
    fn drop(&mut self) {
        self.bar.finish();
    }
}
