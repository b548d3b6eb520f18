use indicatif::{ProgressBar, ProgressStyle};
use lazy_static::lazy_static;
use std::borrow::Cow;
use std::time::Duration;

/// How often should progress bars be redrawn?
pub const PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

lazy_static! {
    // NOTE: lookups take wildly different times depending on the registry's load, so the ETA
    //       that indicatif estimates is not shown.
    static ref NAMES_STYLE: ProgressStyle =
        ProgressStyle::with_template("{msg}  {bar} {percent:>3}%  {pos}/{len} names  [{elapsed_precise}]")
            .expect("progress bar style template should compile");

    static ref FINISH_STYLE: ProgressStyle =
        ProgressStyle::with_template("{msg} [{elapsed_precise}]")
            .expect("progress bar style template should compile");
}

/// A progress bar over a known number of names, or a no-op when disabled.
///
/// Clones share the same underlying bar.
#[derive(Clone)]
pub struct Progress {
    inner: ProgressBar,
}

impl Progress {
    pub fn new_bar<T: Into<Cow<'static, str>>>(total: u64, message: T, enabled: bool) -> Self {
        let inner = if enabled {
            let inner = ProgressBar::new(total)
                .with_style(NAMES_STYLE.clone())
                .with_message(message);
            inner.enable_steady_tick(PROGRESS_UPDATE_INTERVAL);
            inner
        } else {
            ProgressBar::hidden()
        };
        Progress { inner }
    }

    pub fn hidden() -> Self {
        Progress {
            inner: ProgressBar::hidden(),
        }
    }

    /// Run `f` with the bar cleared, so that anything it prints isn't drawn over.
    #[inline]
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.inner.suspend(f)
    }

    #[inline]
    pub fn inc(&self, n: u64) {
        self.inner.inc(n);
    }

    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    pub fn finish_with_message<T: Into<Cow<'static, str>>>(&self, message: T) {
        self.inner.set_style(FINISH_STYLE.clone());
        self.inner.finish_with_message(message);
    }
}
