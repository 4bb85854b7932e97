pub mod analyzer;
pub mod config;
pub mod parser;
pub mod patch;
pub mod version;
