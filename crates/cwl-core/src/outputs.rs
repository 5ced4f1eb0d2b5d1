//! `outputs:` parameter declarations.

use crate::deserialize::{deserialize_list, Identifiable};
use crate::inputs::SecondaryFileSchema;
use crate::types::CWLType;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutputParameter {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub type_: CWLType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_binding: Option<CommandOutputBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_files: Vec<SecondaryFileSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Identifiable for CommandOutputParameter {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

pub(crate) fn deserialize_outputs<'de, D>(deserializer: D) -> Result<Vec<CommandOutputParameter>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_list(deserializer)
}

/// `outputBinding:` — how an output's value is located once the command
/// line that produced it has run (§3, out of scope for actual globbing; the
/// inspector reports the binding, it does not evaluate it against a
/// filesystem).
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutputBinding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "outputEval")]
    pub output_eval: Option<String>,
    #[serde(default)]
    pub load_contents: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutputParameter {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub type_: CWLType,
    #[serde(rename = "outputSource", skip_serializing_if = "Option::is_none")]
    pub output_source: Option<String>,
}

impl Identifiable for WorkflowOutputParameter {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
