pub use bridge::*;
pub use config::*;
pub use error::*;
pub use handle::*;
pub use model::*;
pub use service::*;
pub use transport::*;

mod bridge;
mod config;
mod error;
mod handle;
mod model;
mod service;
mod transport;
