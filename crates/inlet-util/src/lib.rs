#![forbid(unsafe_code)]
//! Coordinates, version specifications, and argument helpers for Inlet.

pub mod args;
pub mod coordinate;
pub mod error;
pub mod version;
