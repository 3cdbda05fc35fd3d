//! Parse and validate `inlet.toml` and `inlet.lock`.

pub mod lockfile;
pub mod manifest;

pub use lockfile::Lockfile;
pub use manifest::Manifest;
