//! Parser trait definition

use crate::parser::types::DependencyReference;

/// Trait for extracting dependency references from automation files
pub trait Parser {
    /// Check if this parser can handle the given URI
    fn can_parse(&self, uri: &str) -> bool;

    /// Parse the content and extract dependency references
    fn parse(&self, content: &str) -> Result<Vec<DependencyReference>, ParseError>;
}

/// Error type for parsing operations
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to parse the file structure
    #[error("Failed to parse file: {0}")]
    ParseFailed(String),

    /// Tree-sitter related error
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}
