use std::io::{self, Write};

/// Destination for the text of `log` records.
pub trait OutputSink {
    fn clear(&mut self);
    fn append(&mut self, text: &str);
    fn scroll_to_end(&mut self) {}
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn clear(&mut self) {
        (**self).clear();
    }

    fn append(&mut self, text: &str) {
        (**self).append(text);
    }

    fn scroll_to_end(&mut self) {
        (**self).scroll_to_end();
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn clear(&mut self) {
        (**self).clear();
    }

    fn append(&mut self, text: &str) {
        (**self).append(text);
    }

    fn scroll_to_end(&mut self) {
        (**self).scroll_to_end();
    }
}

/// In-memory output surface: accumulated text plus a scroll position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextSurface {
    text: String,
    scroll_offset: usize,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset the surface is scrolled to; the text length after `scroll_to_end`.
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn is_scrolled_to_end(&self) -> bool {
        self.scroll_offset == self.text.len()
    }
}

impl OutputSink for TextSurface {
    fn clear(&mut self) {
        self.text.clear();
        self.scroll_offset = 0;
    }

    fn append(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn scroll_to_end(&mut self) {
        self.scroll_offset = self.text.len();
    }
}

/// Writes log text straight to a terminal or file.
///
/// A writer cannot take back what it already emitted, so `clear` is a no-op.
pub struct WriterSink<W: Write> {
    writer: W,
    failed: bool,
}

pub type StdoutSink = WriterSink<io::Stdout>;

impl StdoutSink {
    pub fn stdout() -> Self {
        WriterSink::new(io::stdout())
    }
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn report(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            if !self.failed {
                tracing::warn!("output sink write failed: {err}");
                self.failed = true;
            }
        }
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn clear(&mut self) {}

    fn append(&mut self, text: &str) {
        let result = self.writer.write_all(text.as_bytes());
        self.report(result);
    }

    fn scroll_to_end(&mut self) {
        let result = self.writer.flush();
        self.report(result);
    }
}
