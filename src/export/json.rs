use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_derive::Serialize;

use crate::{BoneCategory, ExportError, ExportRecord, Frame, MotionData};

pub const JSON_FORMAT_NAME: &str = "bone motion data in by frame and by bone type";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonMetadata {
    pub format: &'static str,
    pub coordinate_system: &'static str,
    pub frame_count: usize,
    pub bone_count: usize,
    pub frame_range: Option<[Frame; 2]>,
}

impl JsonMetadata {
    pub fn new(motion: &MotionData) -> Self {
        Self {
            format: JSON_FORMAT_NAME,
            coordinate_system: motion.coordinate_system.label(),
            frame_count: motion.records.len(),
            bone_count: motion.bones.len(),
            frame_range: motion.frame_range().map(|(min, max)| [min, max]),
        }
    }
}

/// Bones grouped by category. Categories and bones keep first-seen order.
pub fn group_by_category(bones: &[String]) -> Vec<(BoneCategory, Vec<usize>)> {
    let mut groups: Vec<(BoneCategory, Vec<usize>)> = Vec::new();
    for (index, bone) in bones.iter().enumerate() {
        let category = BoneCategory::classify(bone);
        match groups.iter_mut().find(|(x, _)| *x == category) {
            Some((_, members)) => members.push(index),
            None => groups.push((category, vec![index])),
        }
    }
    groups
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    metadata: JsonMetadata,
    by_frame: ByFrame<'a>,
    by_bone_type: ByBoneType<'a>,
}

/// `{ "<frame>": { "<bone>": values } }` in record order
struct ByFrame<'a>(&'a MotionData);

struct FrameBones<'a> {
    bones: &'a [String],
    record: &'a ExportRecord,
}

/// `{ "<category>": { "<bone>": { "frames": { "<frame>": values } } } }`
struct ByBoneType<'a> {
    motion: &'a MotionData,
    groups: Vec<(BoneCategory, Vec<usize>)>,
}

struct CategoryBones<'a> {
    motion: &'a MotionData,
    members: &'a [usize],
}

#[derive(Serialize)]
struct BoneFrames<'a> {
    frames: BoneTrack<'a>,
}

struct BoneTrack<'a> {
    motion: &'a MotionData,
    bone: usize,
}

impl<'a> Serialize for ByFrame<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.records.len()))?;
        for record in self.0.records.iter() {
            let bones = FrameBones {
                bones: &self.0.bones,
                record,
            };
            map.serialize_entry(&record.frame.to_string(), &bones)?;
        }
        map.end()
    }
}

impl<'a> Serialize for FrameBones<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (bone, sample) in self.record.bones(self.bones) {
            map.serialize_entry(bone, sample)?;
        }
        map.end()
    }
}

impl<'a> Serialize for ByBoneType<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (category, members) in self.groups.iter() {
            let bones = CategoryBones {
                motion: self.motion,
                members,
            };
            map.serialize_entry(category.as_str(), &bones)?;
        }
        map.end()
    }
}

impl<'a> Serialize for CategoryBones<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.members.len()))?;
        for &bone in self.members.iter() {
            let frames = BoneFrames {
                frames: BoneTrack {
                    motion: self.motion,
                    bone,
                },
            };
            map.serialize_entry(&self.motion.bones[bone], &frames)?;
        }
        map.end()
    }
}

impl<'a> Serialize for BoneTrack<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for record in self.motion.records.iter() {
            if let Some(Some(sample)) = record.values.get(self.bone) {
                map.serialize_entry(&record.frame.to_string(), sample)?;
            }
        }
        map.end()
    }
}

/// Pretty printed document with `metadata`, `by_frame` and `by_bone_type`
pub fn render_json(motion: &MotionData) -> Result<Vec<u8>, ExportError> {
    let document = JsonDocument {
        metadata: JsonMetadata::new(motion),
        by_frame: ByFrame(motion),
        by_bone_type: ByBoneType {
            motion,
            groups: group_by_category(&motion.bones),
        },
    };
    serde_json::to_vec_pretty(&document).map_err(ExportError::Serialize)
}
