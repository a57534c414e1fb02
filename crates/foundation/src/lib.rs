pub mod bounds;
pub mod future;
pub mod quantize;

// Foundation crate: small, well-tested geo primitives only.
pub use bounds::*;
pub use future::*;
pub use quantize::*;
