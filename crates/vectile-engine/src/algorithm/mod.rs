//! Frame-level algorithms that are independent of any graphics backend.

pub mod clip_ids;

pub use clip_ids::{ClipId, ClipIdGenerator};
