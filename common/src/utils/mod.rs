//! Utility functions and helpers.

pub mod file_name;

pub use file_name::FileNameGenerator;
