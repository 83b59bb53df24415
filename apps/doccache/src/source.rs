//! Newline-delimited JSON event source (stdin or a file).

use doccache_core::{DoccacheError, StreamEvent};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

/// Reads one [`StreamEvent`] per non-blank line.
pub struct DeltaSource<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl DeltaSource<BufReader<tokio::io::Stdin>> {
    /// Events from standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl DeltaSource<BufReader<tokio::fs::File>> {
    /// Events from a file.
    pub async fn open(path: &Path) -> Result<Self, DoccacheError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| DoccacheError::IoError(format!("{}: {e}", path.display())))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> DeltaSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// The next event, or `None` at end of input.
    pub async fn next_event(&mut self) -> Result<Option<StreamEvent>, DoccacheError> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| DoccacheError::IoError(format!("line {}: {e}", self.line_no + 1)))?;
            let Some(line) = line else {
                return Ok(None);
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return StreamEvent::from_line(&line).map(Some);
        }
    }
}
