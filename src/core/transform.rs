use glam::{DAffine3, DQuat, DVec3, EulerRot};
use serde_derive::{Deserialize, Serialize};

/// One scalar component of a sampled transform
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    PosX,
    PosY,
    PosZ,
    RotX,
    RotY,
    RotZ,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::PosX,
        Channel::PosY,
        Channel::PosZ,
        Channel::RotX,
        Channel::RotY,
        Channel::RotZ,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column suffix used by the tabular writer
    pub const fn column(self) -> &'static str {
        match self {
            Channel::PosX => "pos_x",
            Channel::PosY => "pos_y",
            Channel::PosZ => "pos_z",
            Channel::RotX => "rot_x",
            Channel::RotY => "rot_y",
            Channel::RotZ => "rot_z",
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<DVec3> for Axes {
    fn from(value: DVec3) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
        }
    }
}

impl From<Axes> for DVec3 {
    fn from(value: Axes) -> Self {
        DVec3::new(value.x, value.y, value.z)
    }
}

/// Pose of a single bone at a single frame. Rotation is in Euler radians
/// applied in X, Y, Z order.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSample {
    pub position: Axes,
    pub rotation: Axes,
}

impl TransformSample {
    pub fn new(position: DVec3, rotation: DVec3) -> Self {
        Self {
            position: position.into(),
            rotation: rotation.into(),
        }
    }

    pub fn channels(&self) -> [f64; 6] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        ]
    }

    pub fn channel(&self, channel: Channel) -> f64 {
        self.channels()[channel.index()]
    }

    pub fn from_channels(values: [f64; 6]) -> Self {
        Self {
            position: Axes {
                x: values[0],
                y: values[1],
                z: values[2],
            },
            rotation: Axes {
                x: values[3],
                y: values[4],
                z: values[5],
            },
        }
    }

    /// Maps every channel through `f`, in channel order
    pub fn map_channels(&self, mut f: impl FnMut(Channel, f64) -> f64) -> Self {
        let mut values = self.channels();
        for channel in Channel::ALL {
            values[channel.index()] = f(channel, values[channel.index()]);
        }
        Self::from_channels(values)
    }
}

/// Euler angles with X applied first. glam's `ZYX` yields the same matrix
/// (Rz * Ry * Rx) with the angles returned outermost first.
pub fn euler_xyz(rotation: DQuat) -> DVec3 {
    let (z, y, x) = rotation.to_euler(EulerRot::ZYX);
    DVec3::new(x, y, z)
}

pub fn quat_from_euler_xyz(euler: DVec3) -> DQuat {
    DQuat::from_euler(EulerRot::ZYX, euler.z, euler.y, euler.x)
}

impl From<DAffine3> for TransformSample {
    fn from(value: DAffine3) -> Self {
        let (_scale, rotation, translation) = value.to_scale_rotation_translation();
        Self::new(translation, euler_xyz(rotation))
    }
}
