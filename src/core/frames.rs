use std::num::NonZeroU32;

use crate::ExportError;

pub type Frame = i32;

/// Output size bound used when full-frame export is disabled
pub const AUTO_STRIDE_TARGET_SAMPLES: u32 = 500;

/// Inclusive frame range with `start <= end`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameRange {
    start: Frame,
    end: Frame,
}

impl FrameRange {
    pub fn new(start: Frame, end: Frame) -> Result<Self, ExportError> {
        if start > end {
            return Err(ExportError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Frame {
        self.start
    }

    pub fn end(&self) -> Frame {
        self.end
    }

    pub fn span(&self) -> u32 {
        self.end.abs_diff(self.start)
    }

    /// `max(frame_step, span / 500)`, bounding the number of exported rows
    pub fn auto_capped_stride(&self, frame_step: NonZeroU32) -> NonZeroU32 {
        frame_step.max(
            NonZeroU32::new(self.span() / AUTO_STRIDE_TARGET_SAMPLES).unwrap_or(NonZeroU32::MIN),
        )
    }

    pub fn sampler(&self, stride: NonZeroU32) -> FrameSampler {
        FrameSampler {
            range: *self,
            stride,
        }
    }
}

/// Arithmetic progression over a frame range. The end frame is only produced
/// when it lies on the stride grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameSampler {
    range: FrameRange,
    stride: NonZeroU32,
}

impl FrameSampler {
    pub fn new(start: Frame, end: Frame, stride: NonZeroU32) -> Result<Self, ExportError> {
        Ok(FrameRange::new(start, end)?.sampler(stride))
    }

    pub fn range(&self) -> FrameRange {
        self.range
    }

    pub fn stride(&self) -> NonZeroU32 {
        self.stride
    }

    pub fn len(&self) -> usize {
        (self.range.span() / self.stride.get()) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn last(&self) -> Frame {
        self.frame_at(self.len() - 1)
    }

    /// Frame at position `index` of the progression, `index < len()`
    pub fn frame_at(&self, index: usize) -> Frame {
        let offset = index as i64 * self.stride.get() as i64;
        (self.range.start as i64 + offset) as Frame
    }

    pub fn iter(&self) -> FrameIter {
        FrameIter {
            sampler: *self,
            next: 0,
            len: self.len(),
        }
    }
}

impl IntoIterator for FrameSampler {
    type Item = Frame;
    type IntoIter = FrameIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &FrameSampler {
    type Item = Frame;
    type IntoIter = FrameIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct FrameIter {
    sampler: FrameSampler,
    next: usize,
    len: usize,
}

impl Iterator for FrameIter {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let frame = self.sampler.frame_at(self.next);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameIter {}
