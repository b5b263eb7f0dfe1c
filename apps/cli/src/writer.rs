//! Log writer that keeps progress bars intact

use indicatif::MultiProgress;
use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

/// Writes log lines to stderr while the bars of `progress` are hidden
#[derive(Clone)]
pub struct IndicatifWriter {
    progress: MultiProgress,
}

impl IndicatifWriter {
    pub fn new(progress: MultiProgress) -> Self {
        Self { progress }
    }
}

impl Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.progress.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.progress.suspend(|| io::stderr().flush())
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = IndicatifWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
