//! Data model for platform variants and resolved control parameters

mod control;
mod flags;
mod gear;
mod variant;

pub use control::*;
pub use flags::*;
pub use gear::*;
pub use variant::*;
