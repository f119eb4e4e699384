use tracing::debug;

use crate::handler::RecordHandler;
use crate::lines::LineBuffer;
use crate::record::Record;
use crate::sink::OutputSink;

/// Counters for one consumed response body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub bytes: u64,
    pub records: usize,
    pub log_records: usize,
    pub tree_records: usize,
    pub other_records: usize,
    /// Lines that were not JSON and were displayed as raw log text.
    pub fallback_records: usize,
}

/// Turns response chunks into records for one submission.
pub struct Dispatcher<S, H> {
    buffer: LineBuffer,
    sink: S,
    handler: H,
    summary: StreamSummary,
}

impl<S: OutputSink, H: RecordHandler> Dispatcher<S, H> {
    pub fn new(sink: S, handler: H) -> Self {
        Self {
            buffer: LineBuffer::new(),
            sink,
            handler,
            summary: StreamSummary::default(),
        }
    }

    /// Starts a fresh submission: empties the buffer and the output surface.
    pub fn begin(&mut self) {
        self.buffer.reset();
        self.summary = StreamSummary::default();
        self.sink.clear();
    }

    /// Dispatches every record completed by `chunk`; returns how many.
    pub fn feed(&mut self, chunk: &[u8]) -> usize {
        self.summary.bytes += chunk.len() as u64;
        let before = self.summary.records;
        for line in self.buffer.push(chunk) {
            self.dispatch_line(&line);
        }
        self.summary.records - before
    }

    /// Flushes an unterminated last line once the body has ended.
    pub fn finish(&mut self) -> StreamSummary {
        if let Some(tail) = self.buffer.finish() {
            self.dispatch_line(&tail);
        }
        self.summary.clone()
    }

    pub fn summary(&self) -> &StreamSummary {
        &self.summary
    }

    pub fn into_parts(self) -> (S, H) {
        (self.sink, self.handler)
    }

    fn dispatch_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        let record = match Record::try_parse(line) {
            Some(record) => record,
            None => {
                self.summary.fallback_records += 1;
                Record::fallback(line)
            }
        };
        self.dispatch(record);
    }

    pub fn dispatch(&mut self, record: Record) {
        debug!(kind = record.kind(), "dispatching record");
        self.summary.records += 1;
        match &record {
            Record::Log { line } => {
                self.summary.log_records += 1;
                self.sink.append(line);
                self.sink.scroll_to_end();
            }
            Record::Tree { .. } => self.summary.tree_records += 1,
            Record::Other(_) => self.summary.other_records += 1,
        }
        self.handler.handle(&record);
    }
}
