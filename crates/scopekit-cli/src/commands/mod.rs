//! CLI command implementations.

pub mod common;
pub mod config;
pub mod decode;
pub mod generate;
pub mod measure;
pub mod spectrum;
