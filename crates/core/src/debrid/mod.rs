//! Debrid service integration: client trait, Real-Debrid implementation,
//! and the activation pipeline.

pub mod pipeline;
pub mod realdebrid;
pub mod types;

pub use pipeline::{ActivationPipeline, ActivationResult};
pub use realdebrid::{RealDebridClient, RealDebridConfig};
pub use types::{AccountInfo, ActiveTorrent, DebridClient, DebridError};
