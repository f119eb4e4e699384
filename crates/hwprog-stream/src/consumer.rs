use futures_util::{Stream, StreamExt};
use reqwest::Client;
use tracing::{info, warn};

use crate::dispatch::{Dispatcher, StreamSummary};
use crate::error::StreamError;
use crate::form::FormData;
use crate::handler::RecordHandler;
use crate::sink::OutputSink;

/// Posts a form to one endpoint and streams the NDJSON response into a sink
/// and handler.
#[derive(Clone, Debug)]
pub struct StreamConsumer {
    client: Client,
    endpoint: String,
}

pub fn default_client() -> Result<Client, StreamError> {
    Ok(Client::builder()
        .user_agent(concat!("hwprog/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

impl StreamConsumer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, StreamError> {
        Ok(Self::with_client(default_client()?, endpoint))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Clears the sink, submits `form`, and dispatches records until the
    /// server closes the body.
    ///
    /// Transport failures are returned as-is; records already dispatched stay
    /// where they are. There is no retry.
    pub async fn submit<S, H>(
        &self,
        form: &FormData,
        sink: S,
        handler: H,
    ) -> Result<StreamSummary, StreamError>
    where
        S: OutputSink,
        H: RecordHandler,
    {
        let mut dispatcher = Dispatcher::new(sink, handler);
        dispatcher.begin();

        let body = form.to_multipart().await?;
        info!(endpoint = %self.endpoint, "submitting form");
        let resp = self.client.post(&self.endpoint).multipart(body).send().await?;
        if !resp.status().is_success() {
            warn!(
                endpoint = %self.endpoint,
                status = %resp.status(),
                "server answered with an error status; streaming its body anyway"
            );
        }

        let summary = consume(resp.bytes_stream(), &mut dispatcher).await?;
        info!(
            endpoint = %self.endpoint,
            records = summary.records,
            bytes = summary.bytes,
            "stream finished"
        );
        Ok(summary)
    }
}

/// Pulls chunks until the stream ends, then flushes the last partial line.
///
/// A chunk error stops consumption immediately without flushing, since the
/// pending bytes belong to a line the server never finished.
pub async fn consume<St, B, E, S, H>(
    stream: St,
    dispatcher: &mut Dispatcher<S, H>,
) -> Result<StreamSummary, StreamError>
where
    St: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<StreamError>,
    S: OutputSink,
    H: RecordHandler,
{
    let mut stream = std::pin::pin!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        dispatcher.feed(chunk.as_ref());
    }
    Ok(dispatcher.finish())
}
