//! Bone motion export.
//!
//! An export runs in two phases over the host's frame cursor: a bounded
//! pre-scan estimating normalization bounds (only for normalized output), then
//! one pass over every sampled frame producing [`ExportRecord`]s. Output is
//! rendered in memory and written in one go once sampling has succeeded.

mod csv;
mod json;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

pub use self::csv::*;
pub use self::json::*;

use crate::{
    estimate_bounds, BoneSelection, CoordinateSystem, ExportError, ExportFormat, ExportSettings,
    Frame, FrameCursor, FrameSampler, PoseHost, TransformSample,
};

/// Values of every exported bone at one frame, index-aligned with
/// [`MotionData::bones`]. `None` marks a bone skipped at this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    pub frame: Frame,
    pub values: Vec<Option<TransformSample>>,
}

impl ExportRecord {
    pub fn bones<'a>(
        &'a self,
        names: &'a [String],
    ) -> impl Iterator<Item = (&'a str, &'a TransformSample)> + 'a {
        names
            .iter()
            .zip(self.values.iter())
            .filter_map(|(name, value)| value.as_ref().map(|value| (name.as_str(), value)))
    }
}

/// Sampled, rounded and optionally normalized motion of the selected bones
#[derive(Debug, Clone, PartialEq)]
pub struct MotionData {
    pub coordinate_system: CoordinateSystem,
    pub precision: u8,
    pub bones: Vec<String>,
    pub records: Vec<ExportRecord>,
}

impl MotionData {
    /// Lowest and highest exported frame. With a stride this can end before
    /// the configured end frame.
    pub fn frame_range(&self) -> Option<(Frame, Frame)> {
        let min = self.records.iter().map(|x| x.frame).min()?;
        let max = self.records.iter().map(|x| x.frame).max()?;
        Some((min, max))
    }

    pub fn render(&self, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        match format {
            ExportFormat::Csv => Ok(render_csv(self).into_bytes()),
            ExportFormat::Json => render_json(self),
        }
    }
}

/// Resolves the bones an export covers, in armature order
pub fn select_bones<H: PoseHost + ?Sized>(
    host: &H,
    settings: &ExportSettings,
) -> Result<Vec<String>, ExportError> {
    let armature = host.armature().ok_or(ExportError::MissingArmature)?;
    let bones: Vec<String> = match &settings.bone_selection {
        BoneSelection::All => armature
            .selectable_bones(settings.include_hidden_bones)
            .map(|bone| bone.name.clone())
            .collect(),
        BoneSelection::Bone(name) => match armature.bone(name) {
            Some(bone) => vec![bone.name.clone()],
            None => return Err(ExportError::BoneNotFound(name.clone())),
        },
    };

    if bones.is_empty() {
        return Err(ExportError::EmptySelection);
    }
    Ok(bones)
}

/// Validates the request against the host and plans the frames to visit.
/// Nothing on the host is touched.
pub fn plan_frames<H: PoseHost + ?Sized>(
    host: &H,
    settings: &ExportSettings,
) -> Result<FrameSampler, ExportError> {
    let armature = host.armature().ok_or(ExportError::MissingArmature)?;
    let action_range = host
        .action_range()
        .ok_or_else(|| ExportError::MissingAction(armature.name.clone()))?;
    let range = settings.resolve_range(action_range)?;
    Ok(range.sampler(settings.stride_for(range)))
}

/// Samples the host according to `settings`. The host's frame cursor is
/// restored before returning, whatever the outcome.
pub fn sample_motion<H: PoseHost + ?Sized>(
    host: &mut H,
    settings: &ExportSettings,
) -> Result<MotionData, ExportError> {
    let normalizer = settings.normalizer()?;
    let frames = plan_frames(&*host, settings)?;
    let bones = select_bones(&*host, settings)?;
    let policy = settings.missing_bone_policy;

    log::info!(
        "Sampling {} bone(s) over frames {}..={} every {} frame(s)",
        bones.len(),
        frames.range().start(),
        frames.range().end(),
        frames.stride()
    );

    let mut cursor = FrameCursor::new(host);
    let bounds = match settings.coordinate_system {
        CoordinateSystem::Normalized => {
            Some(estimate_bounds(&mut cursor, &bones, &frames, policy)?)
        }
        CoordinateSystem::World => None,
    };

    let mut records = Vec::with_capacity(frames.len());
    for frame in frames.iter() {
        cursor.goto(frame);
        let mut values = Vec::with_capacity(bones.len());
        for (index, bone) in bones.iter().enumerate() {
            let value = match cursor.bone_pose(bone) {
                Some(sample) => Some(match &bounds {
                    Some(bounds) => normalizer.normalize_sample(&sample, &bounds[index]),
                    None => normalizer.round_sample(&sample),
                }),
                None => {
                    policy.on_missing(bone, frame)?;
                    None
                }
            };
            values.push(value);
        }
        records.push(ExportRecord { frame, values });
    }
    drop(cursor);

    Ok(MotionData {
        coordinate_system: settings.coordinate_system,
        precision: normalizer.precision(),
        bones,
        records,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub frame_count: usize,
    pub bone_count: usize,
    pub frame_range: (Frame, Frame),
    pub bytes_written: usize,
}

/// Samples, renders and writes one export. `path` gets the format's extension
/// appended when missing. The file is only created after sampling succeeded.
pub fn export_motion<H: PoseHost + ?Sized>(
    host: &mut H,
    settings: &ExportSettings,
    path: impl AsRef<Path>,
) -> Result<ExportSummary, ExportError> {
    let path = settings.output_path(path);
    let motion = sample_motion(host, settings)?;
    let bytes = motion.render(settings.export_format)?;

    std::fs::write(&path, &bytes).map_err(|err| ExportError::Write(path.clone(), err))?;

    Ok(ExportSummary {
        frame_count: motion.records.len(),
        bone_count: motion.bones.len(),
        frame_range: motion.frame_range().unwrap_or_default(),
        bytes_written: bytes.len(),
        path,
    })
}

/// Result of an export as reported back to the user
#[derive(Debug)]
pub enum ExportOutcome {
    Finished(ExportSummary),
    Cancelled(ExportError),
}

impl ExportOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, ExportOutcome::Finished(_))
    }

    pub fn report(&self) -> String {
        match self {
            ExportOutcome::Finished(summary) => {
                format!("Motion data exported to: {}", summary.path.display())
            }
            ExportOutcome::Cancelled(err) => err.to_string(),
        }
    }
}

/// Runs [`export_motion`] and turns failures into a cancelled outcome
pub fn run_export<H: PoseHost + ?Sized>(
    host: &mut H,
    settings: &ExportSettings,
    path: impl AsRef<Path>,
) -> ExportOutcome {
    match export_motion(host, settings, path) {
        Ok(summary) => {
            log::info!(
                "Exported {} frame(s) of {} bone(s) to {}",
                summary.frame_count,
                summary.bone_count,
                summary.path.display()
            );
            ExportOutcome::Finished(summary)
        }
        Err(err) => {
            log::error!("Export cancelled: {err}");
            ExportOutcome::Cancelled(err)
        }
    }
}
