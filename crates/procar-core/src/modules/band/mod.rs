//! Dense band-structure arrays built from a parsed PROCAR.

mod model;
mod per_kpoint;

pub use model::{BandModel, ResolvedSelection};
pub use per_kpoint::PerKpointWeights;
