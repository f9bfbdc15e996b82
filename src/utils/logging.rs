use std::io::{self, Write};
use std::sync::{Mutex, Once};

use indicatif::ProgressBar;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter, e.g. `TTAM_LOG=ttam_relatives=debug`.
pub const LOG_ENV: &str = "TTAM_LOG";
const DEFAULT_FILTER: &str = "ttam_relatives=info";

static INIT: Once = Once::new();
static ACTIVE_BAR: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// Installs the stderr subscriber. Safe to call more than once.
///
/// Falls back to `ttam_relatives=info` when `TTAM_LOG` is unset or invalid.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(BarAwareWriter::default).with_target(true))
            .with(filter)
            .init();
    });
}

fn active_bar() -> Option<ProgressBar> {
    ACTIVE_BAR.lock().ok().and_then(|bar| bar.clone())
}

fn set_active_bar(bar: Option<ProgressBar>) {
    if let Ok(mut active) = ACTIVE_BAR.lock() {
        *active = bar;
    }
}

/// Keeps log lines from tearing `bar` until the guard is dropped.
#[must_use]
pub struct LogAroundBar(());

impl LogAroundBar {
    pub fn new(bar: &ProgressBar) -> Self {
        set_active_bar(Some(bar.clone()));
        LogAroundBar(())
    }
}

impl Drop for LogAroundBar {
    fn drop(&mut self) {
        set_active_bar(None);
    }
}

/// Stderr writer that hides the active progress bar while a line is written.
#[derive(Debug, Default, Clone, Copy)]
pub struct BarAwareWriter;

impl Write for BarAwareWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active_bar() {
            Some(bar) => bar.suspend(|| io::stderr().write(buf)),
            None => io::stderr().write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match active_bar() {
            Some(bar) => bar.suspend(|| io::stderr().write_all(buf)),
            None => io::stderr().write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
