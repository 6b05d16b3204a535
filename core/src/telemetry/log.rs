use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use log::info;

/// Human-facing progress lines written while a scan runs.
///
/// Each channel produces one line: the prefix from [`ProgressLog::begin_channel`]
/// followed by one of the three outcomes. Write failures are ignored; the
/// structured report is the only output that matters to callers.
pub struct ProgressLog {
    out: Box<dyn Write + Send>,
}

impl ProgressLog {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    pub fn silent() -> Self {
        Self::new(Box::new(io::sink()))
    }

    /// Log into a shared buffer, handy for inspecting what a scan printed.
    pub fn buffered(buffer: Arc<Mutex<Vec<u8>>>) -> Self {
        Self::new(Box::new(SharedBuffer(buffer)))
    }

    pub fn begin_channel(&mut self, index: usize, total: usize, name: &str, frequency_hz: u32) {
        let _ = write!(
            self.out,
            "[{}/{}] {}  ({:.3} MHz) ... ",
            index,
            total,
            name,
            frequency_hz as f64 / 1.0e6
        );
        let _ = self.out.flush();
    }

    pub fn no_signal(&mut self, name: &str) {
        info!("{}: no signal", name);
        let _ = writeln!(self.out, "no signal");
    }

    pub fn no_sync(&mut self, name: &str) {
        info!("{}: signal but no sync", name);
        let _ = writeln!(self.out, "signal but no sync");
    }

    pub fn found(&mut self, name: &str, label: &str, services: usize, snr_db: f32) {
        info!(
            "{}: found '{}' with {} services at {:.1} dB",
            name, label, services, snr_db
        );
        let _ = writeln!(
            self.out,
            "found: {} ({} services, SNR {:.1} dB)",
            label, services, snr_db
        );
    }
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::stderr()
    }
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "progress buffer poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
