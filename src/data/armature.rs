use std::collections::{BTreeMap, HashMap, VecDeque};

use glam::DAffine3;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

use crate::{quat_from_euler_xyz, Axes};

/// Location and Euler XYZ rotation relative to a parent space
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalTransform {
    pub location: Axes,
    pub rotation: Axes,
}

impl LocalTransform {
    pub const IDENTITY: Self = Self {
        location: Axes {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
        rotation: Axes {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
    };

    pub fn to_affine(&self) -> DAffine3 {
        DAffine3::from_rotation_translation(
            quat_from_euler_xyz(self.rotation.into()),
            self.location.into(),
        )
    }

    /// Per-channel linear interpolation. Euler channels are interpolated
    /// independently, the way animation curves key them.
    pub fn lerp(&self, rhs: &LocalTransform, s: f64) -> Self {
        fn lerp_axes(a: Axes, b: Axes, s: f64) -> Axes {
            Axes {
                x: a.x + (b.x - a.x) * s,
                y: a.y + (b.y - a.y) * s,
                z: a.z + (b.z - a.z) * s,
            }
        }

        Self {
            location: lerp_axes(self.location, rhs.location, s),
            rotation: lerp_axes(self.rotation, rhs.rotation, s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<u16>,
    pub hidden: bool,
    pub rest: LocalTransform,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArmatureError {
    #[error("Bone '{0}' is declared more than once")]
    DuplicateBone(String),
    #[error("Bone '{bone}' references unknown parent '{parent}'")]
    UnknownParent { bone: String, parent: String },
    #[error("Bones {0:?} form a parent cycle")]
    Cycle(Vec<String>),
}

/// Bones are stored topologically sorted: a parent always precedes its children.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArmatureDesc", into = "ArmatureDesc")]
pub struct Armature {
    pub name: String,
    pub world: LocalTransform,
    bones: Vec<Bone>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BoneDesc {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub rest: LocalTransform,
}

impl BoneDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_rest(mut self, rest: LocalTransform) -> Self {
        self.rest = rest;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ArmatureDesc {
    pub name: String,
    #[serde(default)]
    pub world: LocalTransform,
    pub bones: Vec<BoneDesc>,
}

impl TryFrom<ArmatureDesc> for Armature {
    type Error = ArmatureError;

    fn try_from(value: ArmatureDesc) -> Result<Self, Self::Error> {
        Armature::build(value.name, value.world, value.bones)
    }
}

impl From<Armature> for ArmatureDesc {
    fn from(value: Armature) -> Self {
        let bones = value
            .bones
            .iter()
            .map(|bone| BoneDesc {
                name: bone.name.clone(),
                parent: bone
                    .parent
                    .map(|index| value.bones[index as usize].name.clone()),
                hidden: bone.hidden,
                rest: bone.rest,
            })
            .collect();

        Self {
            name: value.name,
            world: value.world,
            bones,
        }
    }
}

impl Armature {
    /// Sorts the declared bones so parents come first. Roots and siblings keep
    /// their declaration order.
    pub fn build(
        name: impl Into<String>,
        world: LocalTransform,
        bones: Vec<BoneDesc>,
    ) -> Result<Self, ArmatureError> {
        let mut lookup: HashMap<&str, usize> = HashMap::with_capacity(bones.len());
        for (index, bone) in bones.iter().enumerate() {
            if lookup.insert(bone.name.as_str(), index).is_some() {
                return Err(ArmatureError::DuplicateBone(bone.name.clone()));
            }
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); bones.len()];
        let mut queue: VecDeque<usize> = VecDeque::new();
        for (index, bone) in bones.iter().enumerate() {
            match bone.parent.as_deref().filter(|x| !x.is_empty()) {
                Some(parent) => {
                    let parent_index =
                        *lookup
                            .get(parent)
                            .ok_or_else(|| ArmatureError::UnknownParent {
                                bone: bone.name.clone(),
                                parent: parent.to_owned(),
                            })?;
                    children[parent_index].push(index);
                }
                None => queue.push_back(index),
            }
        }

        let mut order: Vec<usize> = Vec::with_capacity(bones.len());
        let mut sorted_index: Vec<Option<u16>> = vec![None; bones.len()];
        while let Some(index) = queue.pop_front() {
            sorted_index[index] = Some(order.len() as u16);
            order.push(index);
            for &child in children[index].iter().rev() {
                queue.push_front(child);
            }
        }

        if order.len() != bones.len() {
            let cyclic = bones
                .iter()
                .enumerate()
                .filter(|(index, _)| sorted_index[*index].is_none())
                .map(|(_, bone)| bone.name.clone())
                .collect();
            return Err(ArmatureError::Cycle(cyclic));
        }

        let sorted = order
            .iter()
            .map(|&index| {
                let desc = &bones[index];
                Bone {
                    name: desc.name.clone(),
                    parent: desc
                        .parent
                        .as_deref()
                        .and_then(|parent| lookup.get(parent))
                        .and_then(|&parent| sorted_index[parent]),
                    hidden: desc.hidden,
                    rest: desc.rest,
                }
            })
            .collect();

        Ok(Self {
            name: name.into(),
            world,
            bones: sorted,
        })
    }

    /// Builds an armature of bones at rest from a bone to parent map. An empty
    /// parent marks a root.
    pub fn from_parent_map<T: AsRef<str> + Ord>(
        name: impl Into<String>,
        bones: &BTreeMap<T, T>,
    ) -> Result<Self, ArmatureError> {
        let descs = bones
            .iter()
            .map(|(bone, parent)| BoneDesc {
                name: bone.as_ref().to_owned(),
                parent: Some(parent.as_ref().to_owned()).filter(|x| !x.is_empty()),
                ..Default::default()
            })
            .collect();
        Self::build(name, LocalTransform::IDENTITY, descs)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|x| x.name == name)
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|x| x.name == name)
    }

    /// Bones offered for export, in armature order
    pub fn selectable_bones(&self, include_hidden: bool) -> impl Iterator<Item = &Bone> {
        self.bones
            .iter()
            .filter(move |bone| include_hidden || !bone.hidden)
    }

    /// World matrix of every bone given its animated local transform
    pub fn posed_world_matrices(
        &self,
        mut pose: impl FnMut(&Bone) -> LocalTransform,
    ) -> Vec<DAffine3> {
        let world = self.world.to_affine();
        let mut matrices: Vec<DAffine3> = Vec::with_capacity(self.bones.len());
        for bone in self.bones.iter() {
            let local = bone.rest.to_affine() * pose(bone).to_affine();
            let matrix = match bone.parent {
                Some(parent) => matrices[parent as usize] * local,
                None => local,
            };
            matrices.push(matrix);
        }

        matrices.iter_mut().for_each(|x| *x = world * *x);
        matrices
    }
}
