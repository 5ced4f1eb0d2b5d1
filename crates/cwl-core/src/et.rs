//! `class: ExpressionTool` — a process whose entire body is one JS expression.

use crate::outputs::{deserialize_outputs, CommandOutputParameter};
use crate::requirements::Requirement;
use crate::DocumentBase;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct ExpressionTool {
    #[serde(flatten)]
    pub base: DocumentBase,
    #[serde(default, deserialize_with = "deserialize_outputs")]
    pub outputs: Vec<CommandOutputParameter>,
    pub expression: String,
}

impl Default for ExpressionTool {
    fn default() -> Self {
        Self {
            base: DocumentBase { class: "ExpressionTool".to_string(), ..Default::default() },
            outputs: vec![],
            expression: String::new(),
        }
    }
}

impl Deref for ExpressionTool {
    type Target = DocumentBase;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for ExpressionTool {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

impl ExpressionTool {
    pub fn has_inline_javascript_requirement(&self) -> bool {
        Requirement::has_inline_javascript_requirement(&self.requirements) || Requirement::has_inline_javascript_requirement(&self.hints)
    }
}

/// Whether a `$(...)` parameter reference stands alone as the entire field
/// value or is embedded inside a larger string (§4.4).
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ExpressionType {
    /// `$(...)`: the braces delimit the whole field.
    Paren,
    /// `${...}`: a full JS function body, evaluated as an IIFE.
    Bracket,
}

/// One `$(...)`/`${...}` span located inside a larger string, with its byte
/// range so callers can splice the evaluated result back in.
#[derive(Debug, PartialEq, Clone)]
pub struct Expression {
    pub type_: ExpressionType,
    pub expression: String,
    pub indices: std::ops::Range<usize>,
}

impl Expression {
    /// Returns the JS source to hand to the expression host: a bracket-form
    /// body is wrapped in an immediately-invoked function expression so a
    /// `return` statement (or bare statements) evaluate to a value the same
    /// way a paren-form expression naturally does.
    pub fn expression(&self) -> String {
        match self.type_ {
            ExpressionType::Paren => self.expression.clone(),
            ExpressionType::Bracket => format!("(function() {{ {} }})()", self.expression),
        }
    }
}
