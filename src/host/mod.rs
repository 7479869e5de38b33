//! The authoring host as seen by the exporter.
//!
//! Pose evaluation in a host is a side effect of moving its global frame
//! cursor: after `set_frame(n)` every bone query answers for frame `n`. There
//! is no way to ask for a pose at some other frame, so frames must be visited
//! one at a time and the cursor handed back afterwards.

mod scene;

use std::ops::Deref;

pub use scene::*;

use crate::{Armature, Frame, FrameRange, TransformSample};

pub trait PoseHost {
    /// The active armature, if the active object is one
    fn armature(&self) -> Option<&Armature>;

    /// Frame range of the animation driving the active armature
    fn action_range(&self) -> Option<FrameRange>;

    fn current_frame(&self) -> Frame;

    /// Moves the global cursor and re-evaluates every pose
    fn set_frame(&mut self, frame: Frame);

    /// World space pose of `bone` at the current frame
    fn bone_pose(&self, bone: &str) -> Option<TransformSample>;
}

/// Holds the host for the duration of a sampling pass and puts its frame
/// cursor back where it was when dropped, on success, error or unwind.
pub struct FrameCursor<'a, H: PoseHost + ?Sized> {
    host: &'a mut H,
    original: Frame,
}

impl<'a, H: PoseHost + ?Sized> FrameCursor<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        let original = host.current_frame();
        Self { host, original }
    }

    pub fn original_frame(&self) -> Frame {
        self.original
    }

    /// Always sets the frame, even when already there, so the host
    /// re-evaluates its pose.
    pub fn goto(&mut self, frame: Frame) {
        self.host.set_frame(frame);
    }
}

impl<'a, H: PoseHost + ?Sized> Deref for FrameCursor<'a, H> {
    type Target = H;

    fn deref(&self) -> &Self::Target {
        self.host
    }
}

impl<'a, H: PoseHost + ?Sized> Drop for FrameCursor<'a, H> {
    fn drop(&mut self) {
        if self.host.current_frame() != self.original {
            log::debug!("Restoring frame cursor to {}", self.original);
            self.host.set_frame(self.original);
        }
    }
}
