pub use platform::*;

pub mod platform;
