use commonwl::navigator::NavigationError;
use commonwl::ParseError;
use thiserror::Error;

/// Everything that can go wrong once a document is loaded: resolving a job
/// against its inputs, evaluating an expression, or rendering the command
/// line. Unlike [`ParseError`], most of these are reported per-parameter and
/// do not necessarily abort an entire `inspect` run (§7).
#[derive(Error, Debug)]
pub enum InspectionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("missing required input '{id}'")]
    MissingInput { id: String },

    #[error("input '{id}' does not match declared type")]
    TypeMismatch { id: String },

    #[error("expression '{expression}' failed to evaluate: {source}")]
    Expression { expression: String, #[source] source: rustyscript::Error },

    #[error("expression '{expression}' requires InlineJavascriptRequirement")]
    RequiresInlineJavascript { expression: String },

    #[error("could not read job file {path}: {source}")]
    JobFile { path: std::path::PathBuf, #[source] source: std::io::Error },

    #[error("job file {path} is not valid {format}: {source}")]
    JobFileFormat { path: std::path::PathBuf, format: &'static str, #[source] source: Box<dyn std::error::Error + Send + Sync> },

    #[error("union type has no alternative matching the supplied value: {reasons}")]
    NoUnionAlternative { reasons: String },

    #[error("resource requirement is not satisfiable: {reason}")]
    ResourceRequirement { reason: String },

    #[error("{0}")]
    Other(String),
}
