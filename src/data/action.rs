use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};

use crate::{Frame, FrameRange, LocalTransform};

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Keyframe {
    pub frame: f64,
    #[serde(flatten)]
    pub transform: LocalTransform,
}

/// Keyframes of a single bone, kept sorted by frame
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct BoneCurve {
    keyframes: Vec<Keyframe>,
}

impl From<Vec<Keyframe>> for BoneCurve {
    fn from(mut keyframes: Vec<Keyframe>) -> Self {
        keyframes.sort_by(|a, b| a.frame.total_cmp(&b.frame));
        Self { keyframes }
    }
}

impl From<BoneCurve> for Vec<Keyframe> {
    fn from(value: BoneCurve) -> Self {
        value.keyframes
    }
}

impl BoneCurve {
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn insert(&mut self, keyframe: Keyframe) {
        let index = self
            .keyframes
            .partition_point(|x| x.frame <= keyframe.frame);
        if index > 0 && self.keyframes[index - 1].frame == keyframe.frame {
            self.keyframes[index - 1] = keyframe;
        } else {
            self.keyframes.insert(index, keyframe);
        }
    }

    /// Linear between keys, holding the first and last key outside the keyed span
    pub fn evaluate(&self, frame: f64) -> Option<LocalTransform> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        if frame <= first.frame {
            return Some(first.transform);
        }
        if frame >= last.frame {
            return Some(last.transform);
        }

        let next = self.keyframes.partition_point(|x| x.frame <= frame);
        let a = &self.keyframes[next - 1];
        let b = &self.keyframes[next];
        let s = (frame - a.frame) / (b.frame - a.frame);
        Some(a.transform.lerp(&b.transform, s))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub curves: BTreeMap<String, BoneCurve>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            curves: BTreeMap::new(),
        }
    }

    pub fn insert_key(&mut self, bone: &str, frame: f64, transform: LocalTransform) {
        self.curves
            .entry(bone.to_owned())
            .or_default()
            .insert(Keyframe { frame, transform });
    }

    pub fn with_key(mut self, bone: &str, frame: f64, transform: LocalTransform) -> Self {
        self.insert_key(bone, frame, transform);
        self
    }

    /// Keyed span across all curves, floored to whole frames. `None` when
    /// nothing is keyed.
    pub fn frame_range(&self) -> Option<FrameRange> {
        let frames = self
            .curves
            .values()
            .flat_map(|curve| curve.keyframes().iter().map(|x| x.frame));

        let (min, max) = frames.fold(None, |acc: Option<(f64, f64)>, frame| match acc {
            Some((min, max)) => Some((min.min(frame), max.max(frame))),
            None => Some((frame, frame)),
        })?;

        FrameRange::new(min.floor() as Frame, max.floor() as Frame).ok()
    }

    pub fn evaluate(&self, bone: &str, frame: f64) -> Option<LocalTransform> {
        self.curves.get(bone).and_then(|curve| curve.evaluate(frame))
    }
}
