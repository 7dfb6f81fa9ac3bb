pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod impact;
pub mod ir;
pub mod layout;
pub mod snapshot;
pub mod source;
pub mod theme;
pub mod transform;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
pub use error::{Error, Result};
pub use ir::{RawGraph, VisualEdge, VisualNode};
pub use snapshot::GraphSnapshot;
pub use view::{GraphView, PrepareOptions, prepare};
