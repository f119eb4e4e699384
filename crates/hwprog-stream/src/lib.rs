//! Client side of the hwprog streaming endpoints.
//!
//! A submission posts a form and reads the response body as newline-delimited
//! JSON. Each complete line becomes a [`Record`]: `log` records are appended to
//! an [`OutputSink`], and every record is offered to a [`RecordHandler`]. Lines
//! that are not JSON are shown as raw log text rather than ending the stream.

mod consumer;
mod dispatch;
mod error;
mod form;
mod handler;
mod hub;
mod lines;
mod record;
mod shared;
mod sink;

pub use consumer::{consume, default_client, StreamConsumer};
pub use dispatch::{Dispatcher, StreamSummary};
pub use error::StreamError;
pub use form::{mirror_text, FormData, CHECKED};
pub use handler::{NoopHandler, RecordHandler, RecordLog};
pub use hub::{StreamHub, SubmissionOutcome};
pub use lines::LineBuffer;
pub use record::{Record, ServerNode, TargetNode};
pub use shared::{Guarded, Shared};
pub use sink::{OutputSink, StdoutSink, TextSurface, WriterSink};
