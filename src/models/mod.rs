pub mod format;

pub use format::{ImageFormat, ImagePayload};
