// History module - READ SIDE
// Provenance walks and checkpoint windows over the spend log

mod checkpoint;
mod provenance;

pub use checkpoint::{parse_window, CheckpointAccessor};
pub use provenance::ProvenanceTracer;
