//! Ground network load errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or building a ground network.
///
/// Any of these aborts the load; the ground controller then runs in
/// degraded mode without taxiways.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read ground network {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: unknown ground network element '{tag}'")]
    UnknownTag { line: usize, tag: String },

    #[error("line {line}: unknown node type '{code}' (expected J, T, H or P)")]
    UnknownNodeType { line: usize, code: String },

    #[error("line {line}: unknown arc type '{code}' (expected R or T)")]
    UnknownArcType { line: usize, code: String },

    #[error("line {line}: unknown arc directed value '{code}' (expected Y or N)")]
    BadDirected { line: usize, code: String },

    #[error("line {line}: invalid {field} '{value}'")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: duplicate node id {id}")]
    DuplicateNode { line: usize, id: u32 },

    #[error("line {line}: arc references unknown node {id}")]
    UnknownNode { line: usize, id: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_line_numbers() {
        let err = LoadError::UnknownArcType {
            line: 12,
            code: "X".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "line 12: unknown arc type 'X' (expected R or T)"
        );

        let err = LoadError::UnknownNode { line: 3, id: 99 };
        assert!(err.to_string().contains("unknown node 99"));
    }
}
