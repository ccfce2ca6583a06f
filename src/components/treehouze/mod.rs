//! Graph orchestration core and its browser glue.
//!
//! [`TreeHouze`] owns the dataset cache, the control state and the one live
//! render session; backends implement [`GraphBackend`] and are handed out by a
//! [`BackendFactory`]. [`TreeHouzeCanvas`] wires it all to a canvas with the
//! built-in planar backend.

pub mod backend;
pub mod cache;
pub mod color;
mod component;
pub mod config;
pub mod error;
pub mod graph;
mod input;
pub mod interaction;
pub mod orchestrator;
pub mod panel;
pub mod pin;
pub mod prepare;
mod render;
pub mod select;
pub mod state;
#[cfg(test)]
mod testing;
pub mod types;

pub use backend::{BackendConfig, BackendFactory, GraphBackend, Scene};
pub use component::{ControlPanel, TreeHouzeCanvas};
pub use config::{CtrlUpdate, Options};
pub use error::{DataError, DrawError, ParseError};
pub use orchestrator::{GraphEvent, TreeHouze};
pub use select::PointerInput;
pub use types::{Dim, GraphData, GraphKind, LinkEnds, LinkKind, LinkRecord, NodeKind, NodeRecord, RelationIds};
