use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
};

use serde_derive::{Deserialize, Serialize};

use crate::{ExportError, Frame, FrameRange, Normalizer};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => ".csv",
            ExportFormat::Json => ".json",
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoordinateSystem {
    /// Raw world space values
    World,
    /// Per-bone, per-channel values remapped onto [-1, 1]
    #[default]
    Normalized,
}

impl CoordinateSystem {
    pub const fn label(self) -> &'static str {
        match self {
            CoordinateSystem::World => "world",
            CoordinateSystem::Normalized => "normalized",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoneSelection {
    #[default]
    All,
    Bone(String),
}

/// What to do when a selected bone yields no pose at a sampled frame
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingBonePolicy {
    /// Cancel the whole export
    #[default]
    Abort,
    /// Leave the bone out of that frame
    Skip,
}

impl MissingBonePolicy {
    pub fn on_missing(self, bone: &str, frame: Frame) -> Result<(), ExportError> {
        match self {
            MissingBonePolicy::Abort => Err(ExportError::MissingBonePose {
                bone: bone.to_owned(),
                frame,
            }),
            MissingBonePolicy::Skip => {
                log::warn!("Bone '{bone}' has no pose at frame {frame}, skipping");
                Ok(())
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRangeOverride {
    pub start: Frame,
    pub end: Frame,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ExportSettings {
    pub export_format: ExportFormat,
    pub include_hidden_bones: bool,
    pub bone_selection: BoneSelection,
    /// Overrides the action's frame range when set
    pub frame_range: Option<FrameRangeOverride>,
    /// Exports every `frame_step`th frame; otherwise the stride grows to keep
    /// long ranges near 500 rows
    pub sample_all_frames: bool,
    pub coordinate_system: CoordinateSystem,
    pub frame_step: NonZeroU32,
    pub precision: u8,
    pub missing_bone_policy: MissingBonePolicy,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            export_format: ExportFormat::Csv,
            include_hidden_bones: false,
            bone_selection: BoneSelection::All,
            frame_range: None,
            sample_all_frames: false,
            coordinate_system: CoordinateSystem::Normalized,
            frame_step: NonZeroU32::MIN,
            precision: 6,
            missing_bone_policy: MissingBonePolicy::Abort,
        }
    }
}

impl ExportSettings {
    pub fn from_json_str(path: &Path, text: &str) -> Result<Self, ExportError> {
        let settings: Self = serde_json::from_str(text)
            .map_err(|err| ExportError::SettingsParse(path.to_owned(), err))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|err| ExportError::Read(path.to_owned(), err))?;
        Self::from_json_str(path, &text)
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        self.normalizer()?;
        if let Some(range) = self.frame_range {
            FrameRange::new(range.start, range.end)?;
        }
        Ok(())
    }

    pub fn normalizer(&self) -> Result<Normalizer, ExportError> {
        Normalizer::new(self.precision)
    }

    /// The custom range when one is set, the action range otherwise
    pub fn resolve_range(&self, action_range: FrameRange) -> Result<FrameRange, ExportError> {
        match self.frame_range {
            Some(range) => FrameRange::new(range.start, range.end),
            None => Ok(action_range),
        }
    }

    pub fn stride_for(&self, range: FrameRange) -> NonZeroU32 {
        if self.sample_all_frames {
            self.frame_step
        } else {
            range.auto_capped_stride(self.frame_step)
        }
    }

    /// Appends the format's extension unless `path` already ends with it
    pub fn output_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let extension = self.export_format.extension();
        if path.to_string_lossy().ends_with(extension) {
            path.to_owned()
        } else {
            let mut name = path.as_os_str().to_owned();
            name.push(extension);
            PathBuf::from(name)
        }
    }
}
