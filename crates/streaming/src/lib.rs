pub mod config;
pub mod display;
pub mod error;
pub mod fetch;
pub mod grid;
pub mod http;
pub mod pipeline;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod stats;
pub mod tracker;

pub use config::*;
pub use display::*;
pub use error::*;
pub use fetch::*;
pub use grid::*;
pub use http::*;
pub use pipeline::*;
pub use protocol::{ChunkDataRequest, ChunkListing};
pub use registry::*;
pub use session::*;
pub use stats::*;
pub use tracker::*;
