//! Command implementations

pub mod completions;
pub mod exports;
pub mod manifest;
