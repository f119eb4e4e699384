#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node handle belongs to render {handle}, container is at render {current}")]
    StaleHandle { handle: u64, current: u64 },
    #[error("no node with index {0}")]
    UnknownNode(usize),
    #[error("{0:?} is a device and has no nested list")]
    NotCollapsible(String),
    #[error("nothing has been rendered")]
    Empty,
}
