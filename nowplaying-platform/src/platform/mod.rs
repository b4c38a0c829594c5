pub use guard::*;
pub use platform::*;
pub use platform_souvlaki::*;
#[cfg(target_os = "windows")]
pub use platform_win::*;

mod guard;
mod platform;
mod platform_souvlaki;
#[cfg(target_os = "windows")]
mod platform_win;
