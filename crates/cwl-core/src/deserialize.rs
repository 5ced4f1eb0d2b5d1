//! Shared helpers for deserializing the list-or-mapping surface forms CWL
//! allows for parameter and requirement collections (§4.2).

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_yaml::Value;
use std::fmt::Debug;

/// A parameter-like type that carries its own id, so that the mapping form
/// `{id: {...}}` can be flattened back into the same `Vec<T>` shape as the
/// sequence form `[{id: ..., ...}]`.
pub trait Identifiable {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

/// Deserializes a CWL parameter list that may appear either as a YAML
/// sequence of objects (each carrying its own `id`) or as a mapping from id
/// to object.
pub fn deserialize_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Identifiable + Debug,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|v| serde_yaml::from_value(v).map_err(serde::de::Error::custom))
            .collect(),
        Value::Mapping(map) => map
            .into_iter()
            .map(|(key, val)| {
                let id = key.as_str().ok_or_else(|| serde::de::Error::custom("mapping key is not a string"))?.to_string();
                let mut item: T = serde_yaml::from_value(val).map_err(serde::de::Error::custom)?;
                item.set_id(id);
                Ok(item)
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(serde::de::Error::custom(format!("expected a sequence or mapping, found {other:?}"))),
    }
}
