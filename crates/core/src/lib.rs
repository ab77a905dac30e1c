//! Domain types for the LGL layout pool.
//!
//! Everything here is pure: the graph model handed in by callers, the
//! settings forwarded to layout workers, the Pajek writer for the worker's
//! input file, and the parser/merger for the worker's position output.
//! Process and network I/O live in `lgl-pool`.

pub mod error;
pub mod graph;
pub mod pajek;
pub mod positions;
pub mod settings;

pub use error::CoreError;
pub use graph::{Edge, Graph, Node};
pub use positions::Position;
pub use settings::{JobRequest, LayoutSettings};
