//! Line reassembly for script output streams.
//!
//! Scripts write to stdout in arbitrary pieces (`print` in Python writes the
//! text and the newline separately).  The host's echo channel wants whole
//! lines, so writes are buffered here until a `\n` arrives.

/// Accumulates written text and hands back complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text`; return every line it completes, each ending in `\n`.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buf.push_str(text);
        self.drain_lines()
    }

    /// Take whatever partial line remains, if any.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buf))
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let Some(last_nl) = self.buf.rfind('\n') else { return Vec::new() };
        let rest = self.buf.split_off(last_nl + 1);
        let complete = std::mem::replace(&mut self.buf, rest);
        complete.split_inclusive('\n').map(str::to_owned).collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
