//! Collapsible server → targets → devices trees.
//!
//! A `tree` record is turned into a [`TreeView`] held by a [`TreeContainer`].
//! Servers and targets each carry their own disclosure state; devices are
//! leaves. The view renders as nested-list markup or as a terminal outline.

mod container;
mod error;
mod handler;
pub mod html;
pub mod text;
mod view;

pub use container::{NodeHandle, TreeContainer};
pub use error::TreeError;
pub use handler::TreeRecordHandler;
pub use view::{NodeId, NodeKind, Row, TreeView, ViewNode};
