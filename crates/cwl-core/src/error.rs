use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything that can go wrong while reading a document off disk and
/// resolving it into the typed graph of [`crate::CWLDocument`]s.
///
/// `ParseError` is fatal to the load it occurred in: there is no partial
/// document to keep working with, so callers propagate it unchanged.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{path} does not exist")]
    NotFound { path: PathBuf },

    #[error("could not read {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("YAML parsing of {path} failed: {source}")]
    Yaml { path: PathBuf, #[source] source: serde_yaml::Error },

    #[error("document has no top-level mapping")]
    NotAMapping,

    #[error("'{field}' is required but missing")]
    MissingField { field: String },

    #[error("'{field}' has the wrong kind: expected {expected}, found {found}")]
    WrongKind {
        field: String,
        expected: String,
        found: String,
    },

    #[error("unknown class '{class}' in {location}")]
    UnknownClass { class: String, location: String },

    #[error("unresolved reference '{reference}'")]
    UnresolvedReference { reference: String },

    #[error("type '{name}' is not a primitive and is not defined by any SchemaDefRequirement in scope")]
    UnknownNamedType { name: String },

    #[error("union type has no alternative that resolves: {reasons}")]
    NoUnionAlternative { reasons: String },

    #[error("unsupported cwlVersion '{found}': only v1.0 is supported")]
    UnsupportedVersion { found: String },

    #[error("unsupported host platform '{found}': only linux and macos are recognized")]
    UnsupportedPlatform { found: String },
}

impl ParseError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().to_path_buf(), source }
    }

    pub(crate) fn yaml(path: impl AsRef<Path>, source: serde_yaml::Error) -> Self {
        Self::Yaml { path: path.as_ref().to_path_buf(), source }
    }
}
