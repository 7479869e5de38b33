use std::path::PathBuf;

use thiserror::Error;

use crate::Frame;

/// Coarse classification used when reporting a cancelled export
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingSource,
    Range,
    Selection,
    Io,
    Settings,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Active object must be an armature")]
    MissingArmature,
    #[error("No motion data found on armature {0}")]
    MissingAction(String),
    #[error("Bone '{bone}' has no pose at frame {frame}")]
    MissingBonePose { bone: String, frame: Frame },
    #[error("Bone '{0}' has no pose at any pre-scan frame")]
    NoBoundsSamples(String),
    #[error("Start frame ({start}) must be less than or equal to end frame ({end})")]
    InvalidRange { start: Frame, end: Frame },
    #[error("Selected bone '{0}' not found")]
    BoneNotFound(String),
    #[error("No bones found to export")]
    EmptySelection,
    #[error("Decimal precision must be within {min}..={max}, got {value}")]
    InvalidPrecision { value: u8, min: u8, max: u8 },
    #[error("Invalid settings in {}: {1}", .0.display())]
    SettingsParse(PathBuf, serde_json::Error),
    #[error("Error reading {}: {1}", .0.display())]
    Read(PathBuf, std::io::Error),
    #[error("Error writing file {}: {1}", .0.display())]
    Write(PathBuf, std::io::Error),
    #[error("Error serializing motion data: {0}")]
    Serialize(serde_json::Error),
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::MissingArmature
            | ExportError::MissingAction(_)
            | ExportError::MissingBonePose { .. }
            | ExportError::NoBoundsSamples(_) => ErrorKind::MissingSource,
            ExportError::InvalidRange { .. } => ErrorKind::Range,
            ExportError::BoneNotFound(_) | ExportError::EmptySelection => ErrorKind::Selection,
            ExportError::Read(..) | ExportError::Write(..) | ExportError::Serialize(_) => {
                ErrorKind::Io
            }
            ExportError::InvalidPrecision { .. } | ExportError::SettingsParse(..) => {
                ErrorKind::Settings
            }
        }
    }
}
