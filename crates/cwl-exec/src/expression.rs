//! The JS half of §4.4: locates `$(...)`/`${...}` parameter references inside
//! a string and evaluates them against an embedded V8 runtime.
//!
//! The host is a single hidden global (`RUNTIME`, below) so that nothing
//! outside this module ever touches `rustyscript` directly — the rest of the
//! crate only sees [`evaluate_expression`]/[`replace_expressions`].

use crate::environment::RuntimeEnvironment;
use crate::InspectionError;
use rustyscript::static_runtime;
use serde_json::Value as JsonValue;

static_runtime!(RUNTIME);

/// Loads `inputs`/`runtime`/`self` as globals so that `$(inputs.foo)` and
/// friends resolve. Must be called before any [`eval`] for the duration of
/// one parameter's evaluation; callers reset with [`reset_expression_engine`]
/// when done, since nothing here is session-scoped on its own.
pub fn prepare_expression_engine(environment: &RuntimeEnvironment) -> Result<(), rustyscript::Error> {
    let inputs_json = serde_json::to_string(&environment.inputs).unwrap_or_else(|_| "{}".to_string());
    let runtime_json = serde_json::to_string(&environment.runtime).unwrap_or_else(|_| "{}".to_string());
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        rt.eval::<()>(&format!("var inputs = {inputs_json}; var runtime = {runtime_json};"))
    })
}

thread_local! {
    /// Mirrors the JS `self` global on the Rust side, so pure parameter
    /// references (§4.4) can resolve `self.field` without calling into
    /// `rustyscript` at all.
    static SELF_VALUE: std::cell::RefCell<Option<JsonValue>> = const { std::cell::RefCell::new(None) };
}

pub fn set_self(value: &JsonValue) -> Result<(), rustyscript::Error> {
    SELF_VALUE.with(|s| *s.borrow_mut() = Some(value.clone()));
    let json = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
    RUNTIME.with(|rt| rt.borrow_mut().eval::<()>(&format!("var self = {json};")))
}

pub fn unset_self() -> Result<(), rustyscript::Error> {
    SELF_VALUE.with(|s| *s.borrow_mut() = None);
    RUNTIME.with(|rt| rt.borrow_mut().eval::<()>("var self = null;"))
}

pub fn reset_expression_engine() -> Result<(), rustyscript::Error> {
    RUNTIME.with(|rt| rt.borrow_mut().eval::<()>("inputs = undefined; runtime = undefined; self = undefined;"))
}

/// Evaluates a single JS expression (already stripped of its `$(`/`${`
/// delimiters) against whatever globals [`prepare_expression_engine`] last
/// set up.
pub fn eval(expression: &str) -> Result<JsonValue, rustyscript::Error> {
    RUNTIME.with(|rt| rt.borrow_mut().eval::<JsonValue>(expression))
}

/// One `$(...)`/`${...}` span located inside a larger string.
#[derive(Debug, PartialEq, Clone)]
pub struct ParameterReference {
    pub is_function_body: bool,
    pub body: String,
    pub range: std::ops::Range<usize>,
}

/// Scans `text` for `$(...)`/`${...}` spans, honoring nested
/// parens/braces and skipping escaped `\$`. This is a lexical scan, not a JS
/// parser: it tracks bracket depth and single/double-quoted strings well
/// enough for the expressions CWL documents actually contain.
pub fn find_parameter_references(text: &str) -> Vec<ParameterReference> {
    let bytes = text.as_bytes();
    let mut refs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() && bytes[i + 1] == b'$' {
            i += 2;
            continue;
        }
        if bytes[i] == b'$' && i + 1 < bytes.len() && (bytes[i + 1] == b'(' || bytes[i + 1] == b'{') {
            let is_function_body = bytes[i + 1] == b'{';
            let open = bytes[i + 1];
            let close = if is_function_body { b'}' } else { b')' };
            let start = i;
            let mut depth = 0usize;
            let mut j = i + 1;
            let mut in_string: Option<u8> = None;
            let mut found_end = None;

            while j < bytes.len() {
                let c = bytes[j];
                if let Some(quote) = in_string {
                    if c == b'\\' {
                        j += 2;
                        continue;
                    }
                    if c == quote {
                        in_string = None;
                    }
                } else if c == b'"' || c == b'\'' {
                    in_string = Some(c);
                } else if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth == 0 {
                        found_end = Some(j);
                        break;
                    }
                }
                j += 1;
            }

            if let Some(end) = found_end {
                let body = text[start + 2..end].to_string();
                refs.push(ParameterReference { is_function_body, body, range: start..end + 1 });
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    refs
}

/// A segment of a pure parameter-reference path: `.field` or `[index]`.
#[derive(Debug, PartialEq, Clone)]
enum Segment {
    Field(String),
    Index(usize),
}

/// Parses `inputs.foo.bar[0]`-shaped paths: a bare identifier followed by any
/// number of `.field`/`[index]` segments. Returns `None` for anything that
/// isn't this shape — arithmetic, method calls, string literals — which then
/// falls back to the JS engine.
fn parse_reference_path(body: &str) -> Option<(String, Vec<Segment>)> {
    let bytes = body.as_bytes();
    let mut i = 0;
    let start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    if i == start {
        return None;
    }
    let root = body[start..i].to_string();
    let mut segments = Vec::new();
    while i < bytes.len() {
        match bytes[i] {
            b'.' => {
                i += 1;
                let field_start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                if i == field_start {
                    return None;
                }
                segments.push(Segment::Field(body[field_start..i].to_string()));
            }
            b'[' => {
                i += 1;
                let idx_start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i == idx_start || i >= bytes.len() || bytes[i] != b']' {
                    return None;
                }
                let idx: usize = body[idx_start..i].parse().ok()?;
                segments.push(Segment::Index(idx));
                i += 1;
            }
            _ => return None,
        }
    }
    Some((root, segments))
}

/// Whether `body` is a bare parameter-reference path rather than a JS
/// expression — resolvable without `InlineJavascriptRequirement`.
fn is_pure_reference(body: &str) -> bool {
    let trimmed = body.trim();
    matches!(parse_reference_path(trimmed), Some((root, _)) if root == "inputs" || root == "self" || root == "runtime")
}

fn walk_segments(mut value: JsonValue, segments: &[Segment]) -> Result<JsonValue, String> {
    for segment in segments {
        value = match (segment, value) {
            (Segment::Field(name), JsonValue::Object(mut map)) => map.remove(name).ok_or_else(|| format!("no field '{name}'"))?,
            (Segment::Index(idx), JsonValue::Array(mut items)) => {
                if *idx >= items.len() {
                    return Err(format!("index {idx} out of bounds"));
                }
                items.swap_remove(*idx)
            }
            (segment, _) => return Err(format!("cannot apply {segment:?} to a non-container value")),
        };
    }
    Ok(value)
}

/// `runtime.*` values are stored as strings (see `Runtime::as_map`); the
/// numeric attributes (`cores`, `ram`) round-trip back to JSON numbers so
/// arithmetic on them behaves as CWL documents expect.
fn coerce_runtime_value(raw: &str) -> JsonValue {
    raw.parse::<i64>().map(|n| JsonValue::Number(n.into())).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

/// Resolves a bare `inputs.<id>(.field|[idx])*`, `self(.field|[idx])*` or
/// `runtime.<attr>` path directly against `environment`/the current `self`,
/// without involving the JS engine (§4.4 parameter references).
fn resolve_pure_reference(body: &str, environment: &RuntimeEnvironment) -> Result<JsonValue, String> {
    let (root, segments) = parse_reference_path(body.trim()).ok_or_else(|| "not a parameter reference".to_string())?;
    match root.as_str() {
        "inputs" => {
            let Some((first, rest)) = segments.split_first() else {
                return Err("inputs reference must name a field".to_string());
            };
            let Segment::Field(id) = first else {
                return Err("inputs[...] is not supported".to_string());
            };
            let input = environment.inputs.get(id).ok_or_else(|| format!("no such input '{id}'"))?;
            let json = serde_json::to_value(input).map_err(|e| e.to_string())?;
            walk_segments(json, rest)
        }
        "self" => {
            let value = SELF_VALUE.with(|s| s.borrow().clone()).unwrap_or(JsonValue::Null);
            walk_segments(value, &segments)
        }
        "runtime" => {
            let Some((first, rest)) = segments.split_first() else {
                return Err("runtime reference must name an attribute".to_string());
            };
            let Segment::Field(attr) = first else {
                return Err("runtime[...] is not supported".to_string());
            };
            if !rest.is_empty() {
                return Err("runtime attributes are scalar".to_string());
            }
            let raw = environment.runtime.get(attr).ok_or_else(|| format!("unknown runtime attribute '{attr}'"))?;
            Ok(coerce_runtime_value(raw))
        }
        other => Err(format!("unknown reference root '{other}'")),
    }
}

/// Whether any reference in `refs` names an `inputs.<id>` whose value is
/// Uninstantiated — if so the whole expression short-circuits rather than
/// evaluating against a value that was never actually supplied.
fn references_uninstantiated_input(refs: &[ParameterReference], environment: &RuntimeEnvironment) -> bool {
    refs.iter().any(|r| {
        environment
            .inputs
            .iter()
            .filter(|(_, value)| value.is_uninstantiated())
            .any(|(id, _)| r.body.contains(&format!("inputs.{id}")))
    })
}

/// Evaluates every `$(...)`/`${...}` span in `text`. If `text` is exactly one
/// span with nothing else around it, the resolved value is returned
/// unstringified (so a `File`/array/number stays structured); otherwise each
/// span's result is coerced to a string and spliced back into the
/// surrounding text.
///
/// Per §4.4, bare parameter references (`inputs.foo`, `self.bar`,
/// `runtime.cores`) are always available and never touch the JS engine; full
/// JS bodies only evaluate when `inline_js_enabled` reflects an active
/// `InlineJavascriptRequirement`. A reference into an Uninstantiated input
/// short-circuits to `evaled(<text>)` rather than evaluating at all.
pub fn evaluate_expression(text: &str, environment: &RuntimeEnvironment, inline_js_enabled: bool) -> Result<JsonValue, InspectionError> {
    let refs = find_parameter_references(text);
    if refs.is_empty() {
        return Ok(JsonValue::String(text.to_string()));
    }

    if references_uninstantiated_input(&refs, environment) {
        return Ok(JsonValue::String(format!("evaled({text})")));
    }

    let needs_js = refs.iter().any(|r| r.is_function_body || !is_pure_reference(&r.body));

    if !needs_js {
        if refs.len() == 1 && refs[0].range == (0..text.len()) {
            return resolve_pure_reference(&refs[0].body, environment).map_err(|reason| reference_error(text, &reason));
        }
        let mut out = String::new();
        let mut cursor = 0;
        for reference in &refs {
            out.push_str(&text[cursor..reference.range.start]);
            let value = resolve_pure_reference(&reference.body, environment).map_err(|reason| reference_error(text, &reason))?;
            out.push_str(&json_to_string(&value));
            cursor = reference.range.end;
        }
        out.push_str(&text[cursor..]);
        return Ok(JsonValue::String(out));
    }

    if !inline_js_enabled {
        return Err(InspectionError::RequiresInlineJavascript { expression: text.to_string() });
    }

    prepare_expression_engine(environment).map_err(|source| InspectionError::Expression { expression: text.to_string(), source })?;

    if refs.len() == 1 && refs[0].range == (0..text.len()) {
        let reference = &refs[0];
        let js = wrap_if_function_body(reference);
        let result = eval(&js).map_err(|source| InspectionError::Expression { expression: text.to_string(), source });
        reset_expression_engine().ok();
        return result;
    }

    let mut out = String::new();
    let mut cursor = 0;
    for reference in &refs {
        out.push_str(&text[cursor..reference.range.start]);
        let js = wrap_if_function_body(reference);
        let value = eval(&js).map_err(|source| InspectionError::Expression { expression: text.to_string(), source })?;
        out.push_str(&json_to_string(&value));
        cursor = reference.range.end;
    }
    out.push_str(&text[cursor..]);
    reset_expression_engine().ok();
    Ok(JsonValue::String(out))
}

fn reference_error(text: &str, reason: &str) -> InspectionError {
    InspectionError::Other(format!("expression '{text}' failed to evaluate: {reason}"))
}

fn wrap_if_function_body(reference: &ParameterReference) -> String {
    if reference.is_function_body {
        format!("(function() {{ {} }})()", reference.body)
    } else {
        reference.body.clone()
    }
}

fn json_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// `evaluate_expression`'s counterpart: evaluates `text` and always returns a
/// string, falling back to the original text unchanged if evaluation fails.
/// Used for fields where a raw, already-concrete string is just as valid as
/// an expression result (docker pull strings, globs).
pub fn replace_expressions(text: &str, environment: &RuntimeEnvironment, inline_js_enabled: bool) -> String {
    match evaluate_expression(text, environment, inline_js_enabled) {
        Ok(value) => json_to_string(&value),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_parameter_references_paren() {
        let refs = find_parameter_references("echo $(inputs.name)");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].body, "inputs.name");
        assert!(!refs[0].is_function_body);
    }

    #[test]
    fn test_find_parameter_references_nested_parens() {
        let refs = find_parameter_references("$(inputs.name.split('.')[0])");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].body, "inputs.name.split('.')[0]");
    }

    #[test]
    fn test_find_parameter_references_function_body() {
        let refs = find_parameter_references("${ return inputs.name; }");
        assert_eq!(refs.len(), 1);
        assert!(refs[0].is_function_body);
    }

    #[test]
    fn test_find_parameter_references_ignores_escaped_dollar() {
        let refs = find_parameter_references(r"price: \$(not.an.expr)");
        assert_eq!(refs.len(), 0);
    }

    #[test]
    fn test_find_parameter_references_multiple() {
        let refs = find_parameter_references("$(inputs.a)-$(inputs.b)");
        assert_eq!(refs.len(), 2);
    }

    fn env_with_input(id: &str, value: JsonValue) -> RuntimeEnvironment {
        let mut inputs = std::collections::HashMap::new();
        inputs.insert(id.to_string(), commonwl::types::DefaultValue::Any(serde_yaml::to_value(value).unwrap()));
        RuntimeEnvironment { inputs, runtime: std::collections::HashMap::new(), environment: std::collections::HashMap::new() }
    }

    #[test]
    fn test_pure_reference_resolves_without_js() {
        let environment = env_with_input("name", JsonValue::String("alice".to_string()));
        let result = evaluate_expression("$(inputs.name)", &environment, false).unwrap();
        assert_eq!(result, JsonValue::String("alice".to_string()));
    }

    #[test]
    fn test_js_expression_rejected_without_requirement() {
        let environment = env_with_input("a", JsonValue::Number(1.into()));
        let err = evaluate_expression("$(inputs.a + 1)", &environment, false).unwrap_err();
        assert!(matches!(err, InspectionError::RequiresInlineJavascript { .. }));
    }

    #[test]
    fn test_uninstantiated_input_short_circuits() {
        let mut inputs = std::collections::HashMap::new();
        inputs.insert("message".to_string(), commonwl::types::DefaultValue::Uninstantiated(commonwl::types::UninstantiatedVar("message".to_string())));
        let environment = RuntimeEnvironment { inputs, runtime: std::collections::HashMap::new(), environment: std::collections::HashMap::new() };
        let result = evaluate_expression("$(inputs.message)", &environment, true).unwrap();
        assert_eq!(result, JsonValue::String("evaled($(inputs.message))".to_string()));
    }

    #[test]
    fn test_runtime_reference_resolves_to_number() {
        let mut runtime = std::collections::HashMap::new();
        runtime.insert("cores".to_string(), "4".to_string());
        let environment = RuntimeEnvironment { inputs: std::collections::HashMap::new(), runtime, environment: std::collections::HashMap::new() };
        let result = evaluate_expression("$(runtime.cores)", &environment, false).unwrap();
        assert_eq!(result, JsonValue::Number(4.into()));
    }

    #[test]
    fn test_is_pure_reference_rejects_js() {
        assert!(is_pure_reference("inputs.name"));
        assert!(!is_pure_reference("inputs.name + 1"));
        assert!(!is_pure_reference("inputs.name.split('.')[0]"));
    }
}
