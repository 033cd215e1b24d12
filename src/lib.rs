pub mod archive;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod manager;
pub mod manifest;
pub mod package;
pub mod registry;
pub mod runtime;

pub use config::{Config, Layout};
pub use error::SatPkgrError;
pub use manager::PackageManager;
pub use package::PackageAddress;
