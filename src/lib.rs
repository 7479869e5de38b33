//! Samples bone motion from an animated armature and exports it as CSV or
//! JSON, either in world space or normalized per bone and channel to [-1, 1].

mod bounds;
mod core;
mod data;
mod error;
mod normalize;
mod settings;

pub mod export;
pub mod host;

pub use crate::bounds::*;
pub use crate::core::*;
pub use crate::data::*;
pub use crate::error::*;
pub use crate::export::{
    export_motion, run_export, sample_motion, ExportOutcome, ExportRecord, ExportSummary,
    MotionData,
};
pub use crate::host::{FrameCursor, PoseHost, Scene};
pub use crate::normalize::*;
pub use crate::settings::*;

pub use anyhow;
pub use glam;
pub use serde;
pub use serde_derive;
pub use serde_json;
