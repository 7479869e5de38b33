use std::path::Path;

use anyhow::Context;
use glam::DAffine3;
use serde_derive::{Deserialize, Serialize};

use crate::{Action, Armature, Frame, FrameRange, PoseHost, TransformSample};

/// In-memory host: one armature driven by an optional action. Setting the
/// frame evaluates the action and caches the world matrix of every bone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SceneDesc", into = "SceneDesc")]
pub struct Scene {
    armature: Option<Armature>,
    action: Option<Action>,
    frame_current: Frame,
    pose: Vec<DAffine3>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SceneDesc {
    #[serde(default)]
    pub armature: Option<Armature>,
    #[serde(default)]
    pub action: Option<Action>,
    #[serde(default = "default_frame")]
    pub frame_current: Frame,
}

fn default_frame() -> Frame {
    1
}

impl From<SceneDesc> for Scene {
    fn from(value: SceneDesc) -> Self {
        Scene::new(value.armature, value.action).with_frame(value.frame_current)
    }
}

impl From<Scene> for SceneDesc {
    fn from(value: Scene) -> Self {
        Self {
            armature: value.armature,
            action: value.action,
            frame_current: value.frame_current,
        }
    }
}

impl Scene {
    pub fn new(armature: Option<Armature>, action: Option<Action>) -> Self {
        let mut scene = Self {
            armature,
            action,
            frame_current: default_frame(),
            pose: Vec::new(),
        };
        scene.evaluate();
        scene
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.set_frame(frame);
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse scene {}", path.display()))
    }

    fn evaluate(&mut self) {
        let frame = self.frame_current as f64;
        self.pose = match self.armature.as_ref() {
            Some(armature) => armature.posed_world_matrices(|bone| {
                self.action
                    .as_ref()
                    .and_then(|action| action.evaluate(&bone.name, frame))
                    .unwrap_or_default()
            }),
            None => Vec::new(),
        };
    }
}

impl PoseHost for Scene {
    fn armature(&self) -> Option<&Armature> {
        self.armature.as_ref()
    }

    fn action_range(&self) -> Option<FrameRange> {
        self.action.as_ref().and_then(|action| action.frame_range())
    }

    fn current_frame(&self) -> Frame {
        self.frame_current
    }

    fn set_frame(&mut self, frame: Frame) {
        self.frame_current = frame;
        self.evaluate();
    }

    fn bone_pose(&self, bone: &str) -> Option<TransformSample> {
        let index = self.armature.as_ref()?.bone_index(bone)?;
        self.pose.get(index).copied().map(TransformSample::from)
    }
}
