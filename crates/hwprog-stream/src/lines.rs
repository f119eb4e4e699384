const BOM: &[u8] = b"\xef\xbb\xbf";

/// Accumulates response bytes and hands back complete `\n`-terminated lines.
///
/// Splitting happens on raw bytes and each line is decoded only once it is
/// complete. A newline byte never occurs inside a multi-byte UTF-8 sequence, so
/// a character split across two chunks is reassembled before decoding. Invalid
/// sequences decode to U+FFFD instead of failing the stream. A byte order mark
/// at the very start of the stream is dropped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    past_bom: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and drains every line it completes, without the `\n`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut scan_from = self.pending.len();
        self.pending.extend_from_slice(chunk);
        if !self.past_bom {
            if self.pending.len() < BOM.len() && BOM.starts_with(&self.pending) {
                return Vec::new();
            }
            self.past_bom = true;
            if self.pending.starts_with(BOM) {
                self.pending.drain(..BOM.len());
            }
            scan_from = 0;
        }
        // Only the new bytes can hold a newline; everything before was scanned already.
        let Some(offset) = self.pending[scan_from..].iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let last_newline = scan_from + offset;
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        complete[..last_newline]
            .split(|b| *b == b'\n')
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Takes whatever is left after the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&tail).into_owned())
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.past_bom = false;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
