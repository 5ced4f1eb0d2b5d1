pub mod commandline;
pub mod keys;
pub mod list;
pub mod walk;

use anyhow::{anyhow, Result};
use commonwl::CWLDocument;
use serde_yaml::Value;

/// Parses the `CMD` positional argument into the operation it names (§6):
/// `.path`, `keys(.path)`, `commandline`, or `list`.
pub enum Query {
    Walk(String),
    Keys(String),
    Commandline,
    List,
}

pub fn parse_query(raw: &str) -> Result<Query> {
    if raw == "commandline" {
        return Ok(Query::Commandline);
    }
    if raw == "list" {
        return Ok(Query::List);
    }
    if let Some(inner) = raw.strip_prefix("keys(").and_then(|s| s.strip_suffix(')')) {
        return Ok(Query::Keys(inner.to_string()));
    }
    if raw.starts_with('.') {
        return Ok(Query::Walk(raw.to_string()));
    }
    Err(anyhow!("unrecognized query '{raw}': expected '.path', 'keys(.path)', 'commandline', or 'list'"))
}

pub fn document_snapshot(doc: &CWLDocument) -> Result<Value> {
    serde_yaml::to_value(doc).map_err(|e| anyhow!("failed to snapshot document: {e}"))
}
