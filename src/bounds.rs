//! Normalization bounds from a coarse pre-scan.
//!
//! Extrema are estimated from at most [`PRESCAN_BUDGET`] frames spread over
//! the export, not from every exported frame. Dense samples may therefore land
//! outside the estimated range; the normalizer clamps them.

use std::ops::RangeInclusive;

use serde_derive::{Deserialize, Serialize};

use crate::{
    Channel, ExportError, Frame, FrameCursor, FrameSampler, MissingBonePolicy, PoseHost,
    TransformSample,
};

pub const PRESCAN_BUDGET: usize = 20;

/// Half-width given to channels that never moved during the pre-scan
pub const DEGENERATE_EPSILON: f64 = 0.001;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBounds {
    pub min: f64,
    pub max: f64,
}

impl ChannelBounds {
    pub fn new(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn include(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    pub fn widened(self) -> Self {
        if self.is_degenerate() {
            Self {
                min: self.min - DEGENERATE_EPSILON,
                max: self.max + DEGENERATE_EPSILON,
            }
        } else {
            self
        }
    }

    pub fn range(&self) -> RangeInclusive<f64> {
        self.min..=self.max
    }
}

/// Per-channel bounds of one bone, never degenerate
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationBounds {
    channels: [ChannelBounds; 6],
}

impl NormalizationBounds {
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a TransformSample>) -> Option<Self> {
        let mut samples = samples.into_iter();
        let first = samples.next()?.channels();
        let mut channels = first.map(ChannelBounds::new);
        for sample in samples {
            for (bounds, value) in channels.iter_mut().zip(sample.channels()) {
                bounds.include(value);
            }
        }

        Some(Self {
            channels: channels.map(ChannelBounds::widened),
        })
    }

    pub fn channel(&self, channel: Channel) -> &ChannelBounds {
        &self.channels[channel.index()]
    }

    pub fn channels(&self) -> &[ChannelBounds; 6] {
        &self.channels
    }
}

/// Frames visited by the pre-scan: all of them when there are at most
/// [`PRESCAN_BUDGET`], otherwise that many spread evenly with both ends kept.
pub fn prescan_frames(frames: &FrameSampler) -> Vec<Frame> {
    let len = frames.len();
    if len <= PRESCAN_BUDGET {
        return frames.iter().collect();
    }

    let last = len - 1;
    (0..PRESCAN_BUDGET)
        .map(|i| frames.frame_at(i * last / (PRESCAN_BUDGET - 1)))
        .collect()
}

/// Estimates bounds for every bone in `bones`, visiting each pre-scan frame
/// once. The result is index-aligned with `bones`.
pub fn estimate_bounds<H: PoseHost + ?Sized>(
    cursor: &mut FrameCursor<'_, H>,
    bones: &[String],
    frames: &FrameSampler,
    policy: MissingBonePolicy,
) -> Result<Vec<NormalizationBounds>, ExportError> {
    let prescan = prescan_frames(frames);
    log::debug!(
        "Estimating bounds for {} bone(s) from {} of {} frames",
        bones.len(),
        prescan.len(),
        frames.len()
    );

    let mut samples: Vec<Vec<TransformSample>> = vec![Vec::with_capacity(prescan.len()); bones.len()];
    for &frame in prescan.iter() {
        cursor.goto(frame);
        for (bone, track) in bones.iter().zip(samples.iter_mut()) {
            match cursor.bone_pose(bone) {
                Some(sample) => track.push(sample),
                None => policy.on_missing(bone, frame)?,
            }
        }
    }

    bones
        .iter()
        .zip(samples.iter())
        .map(|(bone, track)| {
            NormalizationBounds::from_samples(track)
                .ok_or_else(|| ExportError::NoBoundsSamples(bone.clone()))
        })
        .collect()
}
