//! Incremental decoder for newline-delimited generation chunks
//!
//! Bytes are accumulated until a `\n` completes a line, and only complete
//! lines are decoded as UTF-8. A multi-byte character split across network
//! chunks therefore never reaches the UTF-8 decoder in halves: `\n` cannot
//! occur inside a multi-byte sequence.

use crate::generation::GenerateChunk;

/// Stateful NDJSON decoder yielding the `response` fragment of each line
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    pending: Vec<u8>,
    malformed: u64,
}

impl NdjsonDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of upstream bytes
    ///
    /// Returns the fragments of every line completed by this chunk, in order.
    /// An incomplete trailing line stays buffered until the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut fragments = Vec::new();
        let mut search_from = self.pending.len();
        self.pending.extend_from_slice(chunk);

        let mut line_start = 0;
        while let Some(offset) = self.pending[search_from..]
            .iter()
            .position(|&byte| byte == b'\n')
        {
            let line_end = search_from + offset;
            let line = &self.pending[line_start..line_end];
            if let Some(fragment) = decode_line(line, &mut self.malformed) {
                fragments.push(fragment);
            }
            line_start = line_end + 1;
            search_from = line_start;
        }

        self.pending.drain(..line_start);
        fragments
    }

    /// Flush the final line when the upstream closes without a trailing newline
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.pending);
        decode_line(&line, &mut self.malformed)
    }

    /// Number of lines dropped because they were not valid JSON chunks
    pub fn malformed_lines(&self) -> u64 {
        self.malformed
    }

    /// Number of bytes waiting for a line terminator
    pub fn buffered_len(&self) -> usize {
        self.pending.len()
    }
}

/// Decode one line; blank lines are skipped without counting as malformed
fn decode_line(line: &[u8], malformed: &mut u64) -> Option<String> {
    let Ok(text) = std::str::from_utf8(line) else {
        *malformed += 1;
        tracing::debug!(line_len = line.len(), "Dropping upstream line with invalid UTF-8");
        return None;
    };

    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match serde_json::from_str::<GenerateChunk>(text) {
        Ok(chunk) => chunk.response.filter(|fragment| !fragment.is_empty()),
        Err(e) => {
            *malformed += 1;
            tracing::debug!(error = %e, "Dropping malformed upstream line");
            None
        }
    }
}
