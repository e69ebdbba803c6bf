//! Narration sink that writes each line to an [`io::Write`].

use std::io::{self, Write};

use biathlon_core::dispatch::Narrator;
use tracing::warn;

/// Writes narration lines, remembering the first write failure.
///
/// Later lines are dropped once a write has failed.
#[derive(Debug)]
pub struct WriterNarrator<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> WriterNarrator<W> {
    /// Wrap a writer.
    pub const fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Flush the writer and report the first failure, if any.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> Narrator for WriterNarrator<W> {
    fn narrate(&mut self, line: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{line}") {
            warn!(error = %err, "narration output failed");
            self.error = Some(err);
        }
    }
}
