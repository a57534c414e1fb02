//! Well-log records: typed layers, raw-record ingestion, gap-filling and
//! terrain adjustment.

pub mod error;
pub mod gap_fill;
pub mod ingest;
pub mod material;
pub mod record;
pub mod terrain;

pub use error::*;
pub use gap_fill::*;
pub use ingest::*;
pub use material::*;
pub use record::*;
pub use terrain::*;
