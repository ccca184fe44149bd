pub mod magick;

pub use magick::*;
