mod action;
mod armature;
mod category;

pub use action::*;
pub use armature::*;
pub use category::*;
