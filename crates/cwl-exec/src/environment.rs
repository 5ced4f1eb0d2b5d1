//! Resolves a job's input values against a document's declared parameters
//! (§4.5), and the bundle of globals (`inputs`, `runtime`, env vars) an
//! expression sees while evaluating.

use crate::runtime::Runtime;
use crate::InspectionError;
use commonwl::inputs::CommandInputParameter;
use commonwl::requirements::Requirement;
use commonwl::types::{CWLType, DefaultValue, EnviromentDefs, UninstantiatedVar};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct RuntimeEnvironment {
    pub inputs: HashMap<String, DefaultValue>,
    pub runtime: HashMap<String, String>,
    pub environment: HashMap<String, String>,
}

impl RuntimeEnvironment {
    pub fn new(inputs: HashMap<String, DefaultValue>, runtime: &Runtime, environment: HashMap<String, String>) -> Self {
        Self { inputs, runtime: runtime.as_map(), environment }
    }
}

/// Resolves `job_values` against `declared` (§4.5): a value present in the
/// job wins if it matches the declared type; otherwise the parameter's
/// `default:` is used; otherwise `null` if the type is optional; otherwise
/// the parameter is Uninstantiated — a sentinel carrying its own id, which
/// renders as `$id` and short-circuits expression evaluation rather than
/// failing outright.
pub fn collect_inputs(declared: &[CommandInputParameter], job_values: &HashMap<String, DefaultValue>) -> Result<HashMap<String, DefaultValue>, InspectionError> {
    let mut resolved = HashMap::new();
    for input in declared {
        let value = match job_values.get(&input.id) {
            Some(value) if value.has_matching_type(&input.type_) => value.clone(),
            Some(value) if matches!(input.type_, CWLType::Any) => value.clone(),
            _ => match &input.default {
                Some(default) => default.clone(),
                None if input.is_optional() => DefaultValue::Any(serde_yaml::Value::Null),
                None => DefaultValue::Uninstantiated(UninstantiatedVar(input.id.clone())),
            },
        };
        resolved.insert(input.id.clone(), value);
    }
    Ok(resolved)
}

/// Flattens every `EnvVarRequirement` in scope (requirements before hints,
/// later entries overriding earlier ones) into a plain name → value map.
pub fn collect_env_vars(requirements: &[Requirement], hints: &[Requirement]) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for req in requirements.iter().chain(hints.iter()) {
        let Requirement::EnvVarRequirement(env_req) = req else { continue };
        match &env_req.env_def {
            EnviromentDefs::Map(map) => vars.extend(map.clone()),
            EnviromentDefs::Vec(defs) => {
                for def in defs {
                    vars.insert(def.env_name.clone(), def.env_value.clone());
                }
            }
        }
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonwl::inputs::CommandInputParameter;
    use serde_yaml::Value;

    #[test]
    fn test_collect_inputs_uses_job_value() {
        let declared = vec![CommandInputParameter::default().with_id("name").with_type(CWLType::String)];
        let mut job = HashMap::new();
        job.insert("name".to_string(), DefaultValue::Any(Value::String("alice".to_string())));
        let resolved = collect_inputs(&declared, &job).unwrap();
        assert_eq!(resolved.get("name").unwrap().as_value_string(), "alice");
    }

    #[test]
    fn test_collect_inputs_falls_back_to_default() {
        let declared = vec![CommandInputParameter::default().with_id("count").with_type(CWLType::Int).with_default(DefaultValue::Any(Value::Number(3.into())))];
        let resolved = collect_inputs(&declared, &HashMap::new()).unwrap();
        assert_eq!(resolved.get("count").unwrap(), &DefaultValue::Any(Value::Number(3.into())));
    }

    #[test]
    fn test_collect_inputs_optional_without_default_is_null() {
        let declared = vec![CommandInputParameter::default().with_id("maybe").with_type(CWLType::Optional(Box::new(CWLType::String)))];
        let resolved = collect_inputs(&declared, &HashMap::new()).unwrap();
        assert_eq!(resolved.get("maybe").unwrap(), &DefaultValue::Any(Value::Null));
    }

    #[test]
    fn test_collect_inputs_missing_required_is_uninstantiated() {
        let declared = vec![CommandInputParameter::default().with_id("name").with_type(CWLType::String)];
        let resolved = collect_inputs(&declared, &HashMap::new()).unwrap();
        let value = resolved.get("name").unwrap();
        assert!(value.is_uninstantiated());
        assert_eq!(value.uninstantiated_id(), Some("name"));
    }

    #[test]
    fn test_collect_env_vars_from_vec() {
        let req = Requirement::EnvVarRequirement(commonwl::requirements::EnvVarRequirement {
            env_def: EnviromentDefs::Vec(vec![commonwl::types::EnvironmentDef { env_name: "FOO".to_string(), env_value: "bar".to_string() }]),
        });
        let vars = collect_env_vars(&[req], &[]);
        assert_eq!(vars.get("FOO").unwrap(), "bar");
    }
}
