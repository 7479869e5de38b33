mod frames;
mod math;
mod transform;

pub use frames::*;
pub use math::*;
pub use transform::*;
