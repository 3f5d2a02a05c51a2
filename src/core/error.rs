// Copyright @yucwang 2026

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeeCacheError {
    /// A configuration option holds a value the cache cannot run with.
    #[error("invalid NEE cache option `{option}`: {reason}")]
    InvalidConfig { option: &'static str, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("obj parse error at line {line}: {message}")]
    ObjParse { line: usize, message: String },

    #[error("exr error: {0}")]
    Exr(String),
}

impl From<quick_xml::Error> for NeeCacheError {
    fn from(err: quick_xml::Error) -> Self {
        NeeCacheError::Xml(err.to_string())
    }
}

impl From<wavefront_obj::ParseError> for NeeCacheError {
    fn from(err: wavefront_obj::ParseError) -> Self {
        NeeCacheError::ObjParse { line: err.line_number, message: err.message }
    }
}

pub type Result<T> = std::result::Result<T, NeeCacheError>;
