//! Concrete profile sources.

pub mod file;

pub use file::FileSource;
