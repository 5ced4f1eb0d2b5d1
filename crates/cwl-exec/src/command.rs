//! The command-line materializer (§4.6): renders the argv a
//! `CommandLineTool` would actually be invoked with, given coerced inputs.

use crate::environment::RuntimeEnvironment;
use crate::expression::evaluate_expression;
use crate::InspectionError;
use commonwl::clt::{Argument, CommandLineTool};
use commonwl::inputs::CommandLineBinding;
use commonwl::types::{CWLType, DefaultValue};
use std::cmp::Ordering;
use std::collections::HashMap;

/// The fully rendered invocation: argv plus the stream redirections and
/// environment a caller would need to actually run it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterializedCommand {
    pub argv: Vec<String>,
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub env: HashMap<String, String>,
    pub uses_shell: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Int(i64),
    Str(String),
}

struct BoundBinding {
    sort_key: (SortKey, SortKey),
    tokens: Vec<String>,
}

/// `preprocess` controls whether `$(...)`/`${...}` fields are evaluated
/// (the default) or carried through to the argv verbatim, for `--without-
/// preprocess` (§6).
pub fn build_command(tool: &CommandLineTool, inputs: &HashMap<String, DefaultValue>, environment: &RuntimeEnvironment, preprocess: bool) -> Result<MaterializedCommand, InspectionError> {
    let inline_js_enabled = tool.has_inline_javascript_requirement();
    // §4.6: a string binding is shell-quoted unless ShellCommandRequirement
    // is active and the binding itself opts out.
    let shell_quote_enabled = |binding: &CommandLineBinding| !tool.has_shell_command_requirement() || binding.shell_quote;

    let mut bindings = Vec::new();

    if let Some(arguments) = &tool.arguments {
        for (index, argument) in arguments.iter().enumerate() {
            match argument {
                Argument::String(s) => {
                    let rendered = evaluate_string_field(s, environment, preprocess, inline_js_enabled)?;
                    bindings.push(BoundBinding {
                        sort_key: (SortKey::Int(0), SortKey::Int(index as i64)),
                        tokens: vec![shell_quote_string(&rendered)],
                    });
                }
                Argument::Binding(binding) => {
                    let position = binding.position.unwrap_or(0) as i64;
                    let value = binding.value_from.as_deref().map(|v| evaluate_string_field(v, environment, preprocess, inline_js_enabled)).transpose()?;
                    let quoted = value.map(|v| if shell_quote_enabled(binding) { shell_quote_string(&v) } else { v });
                    let tokens = render_binding(binding, quoted.as_deref(), None);
                    bindings.push(BoundBinding {
                        sort_key: (SortKey::Int(position), SortKey::Int(index as i64)),
                        tokens,
                    });
                }
            }
        }
    }

    for input in &tool.inputs {
        let Some(binding) = &input.input_binding else { continue };
        let Some(value) = inputs.get(&input.id) else { continue };
        if matches!(value, DefaultValue::Any(serde_yaml::Value::Null)) {
            continue;
        }

        let rendered_value_from = binding
            .value_from
            .as_deref()
            .map(|expr| {
                crate::expression::set_self(&serde_json::to_value(value).unwrap_or(serde_json::Value::Null)).ok();
                let rendered = evaluate_string_field(expr, environment, preprocess, inline_js_enabled);
                crate::expression::unset_self().ok();
                rendered
            })
            .transpose()?;

        let position = binding.position.unwrap_or(0) as i64;
        let tokens = render_input(&input.type_, value, binding, rendered_value_from.as_deref(), shell_quote_enabled(binding));
        bindings.push(BoundBinding {
            sort_key: (SortKey::Int(position), SortKey::Str(input.id.clone())),
            tokens,
        });
    }

    bindings.sort_by(|a, b| compare_sort_key(&a.sort_key, &b.sort_key));

    let mut argv = tool.base_command.as_vec();
    for binding in bindings {
        argv.extend(binding.tokens);
    }

    let stdin = tool.stdin.as_deref().map(|s| evaluate_string_field(s, environment, preprocess, inline_js_enabled)).transpose()?;
    let stdout = tool.stdout.as_deref().map(|s| evaluate_string_field(s, environment, preprocess, inline_js_enabled)).transpose()?;
    let stderr = tool.stderr.as_deref().map(|s| evaluate_string_field(s, environment, preprocess, inline_js_enabled)).transpose()?;

    Ok(MaterializedCommand {
        argv,
        stdin,
        stdout,
        stderr,
        env: environment.environment.clone(),
        uses_shell: tool.has_shell_command_requirement(),
    })
}

fn compare_sort_key(a: &(SortKey, SortKey), b: &(SortKey, SortKey)) -> Ordering {
    a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1))
}

fn evaluate_string_field(text: &str, environment: &RuntimeEnvironment, preprocess: bool, inline_js_enabled: bool) -> Result<String, InspectionError> {
    if !preprocess {
        return Ok(text.to_string());
    }
    let value = evaluate_expression(text, environment, inline_js_enabled)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Quotes a string for POSIX shell evaluation (§8 property 4): wraps it in
/// single quotes and escapes any embedded `'` as `'\''`.
fn shell_quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// A `File`'s path is always a double-quoted literal, independent of
/// `shellQuote` (§4.6 per-binding rendering).
fn quote_file_path(path: &str) -> String {
    format!("\"{path}\"")
}

fn render_binding(binding: &CommandLineBinding, value: Option<&str>, is_bool: Option<bool>) -> Vec<String> {
    if let Some(flag) = is_bool {
        return if flag {
            binding.prefix.clone().into_iter().collect()
        } else {
            vec![]
        };
    }
    let Some(value) = value else { return binding.prefix.clone().into_iter().collect() };
    match &binding.prefix {
        Some(prefix) if binding.separate => vec![prefix.clone(), value.to_string()],
        Some(prefix) => vec![format!("{prefix}{value}")],
        None => vec![value.to_string()],
    }
}

fn render_input(cwl_type: &CWLType, value: &DefaultValue, binding: &CommandLineBinding, value_from: Option<&str>, shell_quote_enabled: bool) -> Vec<String> {
    let inner_type = cwl_type.inner();

    // An unsupplied input with no default renders as its own quoted `$id`
    // placeholder regardless of declared type (§4.4/§4.6 Uninstantiated
    // inputs).
    if value.is_uninstantiated() {
        let rendered = render_scalar(&CWLType::String, value, shell_quote_enabled);
        return render_binding(binding, Some(&rendered), None);
    }

    if let CWLType::Boolean = inner_type {
        let flag = matches!(value, DefaultValue::Any(serde_yaml::Value::Bool(true)));
        return render_binding(binding, None, Some(flag));
    }

    if let (CWLType::Array(item_type), DefaultValue::Array(items)) = (inner_type, value) {
        if let Some(separator) = &binding.item_separator {
            let joined_raw = items.iter().map(DefaultValue::as_value_string).collect::<Vec<_>>().join(separator);
            let joined = if shell_quote_enabled { shell_quote_string(&joined_raw) } else { joined_raw };
            return render_binding(binding, Some(&joined), None);
        }
        // one binding per element, sharing the same prefix, preserving array order
        let rendered_items: Vec<String> = items.iter().map(|item| render_scalar(item_type, item, shell_quote_enabled)).collect();
        return rendered_items.iter().flat_map(|item| render_binding(binding, Some(item), None)).collect();
    }

    if let Some(expr_value) = value_from {
        let rendered = if shell_quote_enabled { shell_quote_string(expr_value) } else { expr_value.to_string() };
        return render_binding(binding, Some(&rendered), None);
    }

    let rendered = render_scalar(inner_type, value, shell_quote_enabled);
    render_binding(binding, Some(&rendered), None)
}

fn render_scalar(cwl_type: &CWLType, value: &DefaultValue, shell_quote_enabled: bool) -> String {
    if matches!(cwl_type, CWLType::File) || matches!(value, DefaultValue::File(_)) {
        return quote_file_path(&value.as_value_string());
    }
    let raw = value.as_value_string();
    if shell_quote_enabled {
        shell_quote_string(&raw)
    } else {
        raw
    }
}
