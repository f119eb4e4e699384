use std::convert::Infallible;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The request could not be sent or the connection dropped mid-stream.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to read form file {}: {source}", .path.display())]
    Form {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no form attached with id {0:?}")]
    UnknownForm(String),
}

impl From<Infallible> for StreamError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
