//! Error types for the PagePilot protocol layer.

mod embedding;
mod planning;
mod provider;

pub use embedding::*;
pub use planning::*;
pub use provider::*;
