//! `class: CommandLineTool` — the leaf process description (§3).

use crate::inputs::CommandInputParameter;
use crate::outputs::{deserialize_outputs, CommandOutputParameter};
use crate::requirements::{deserialize_hints, deserialize_requirements, DockerRequirement, FromRequirement, Requirement};
use crate::DocumentBase;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::{Deref, DerefMut};

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct CommandLineTool {
    #[serde(flatten)]
    pub base: DocumentBase,
    #[serde(default, rename = "baseCommand")]
    pub base_command: Command,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<Argument>>,
    #[serde(default, deserialize_with = "deserialize_outputs")]
    pub outputs: Vec<CommandOutputParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "successCodes")]
    pub success_codes: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "permanentFailCodes")]
    pub permanent_fail_codes: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "temporaryFailCodes")]
    pub temporary_fail_codes: Option<Vec<i32>>,
}

impl Default for CommandLineTool {
    fn default() -> Self {
        Self {
            base: DocumentBase { class: "CommandLineTool".to_string(), ..Default::default() },
            base_command: Command::default(),
            arguments: None,
            outputs: vec![],
            stdin: None,
            stdout: None,
            stderr: None,
            success_codes: None,
            permanent_fail_codes: None,
            temporary_fail_codes: None,
        }
    }
}

impl Deref for CommandLineTool {
    type Target = DocumentBase;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for CommandLineTool {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

impl Display for CommandLineTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_yaml::to_string(self).map_err(|_| std::fmt::Error)?)
    }
}

impl CommandLineTool {
    pub fn with_base_command(mut self, command: Command) -> Self {
        self.base_command = command;
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<Argument>) -> Self {
        self.arguments = Some(arguments);
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<CommandInputParameter>) -> Self {
        self.base.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<CommandOutputParameter>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_requirements(mut self, requirements: Vec<Requirement>) -> Self {
        self.base.requirements = requirements;
        self
    }

    pub fn with_hints(mut self, hints: Vec<Requirement>) -> Self {
        self.base.hints = hints;
        self
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = Some(stdout.to_string());
        self
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = Some(stderr.to_string());
        self
    }

    pub fn get_output_ids(&self) -> Vec<String> {
        self.outputs.iter().map(|o| o.id.clone()).collect()
    }

    pub fn has_shell_command_requirement(&self) -> bool {
        Requirement::has_shell_command_requirement(&self.requirements) || Requirement::has_shell_command_requirement(&self.hints)
    }

    pub fn has_inline_javascript_requirement(&self) -> bool {
        Requirement::has_inline_javascript_requirement(&self.requirements) || Requirement::has_inline_javascript_requirement(&self.hints)
    }

    pub fn get_docker_requirement(&self) -> Option<&DockerRequirement> {
        Requirement::get(&self.requirements).or_else(|| Requirement::get(&self.hints))
    }

    /// Maps a process exit code to success/temporary-failure/permanent-failure,
    /// per the `successCodes`/`temporaryFailCodes`/`permanentFailCodes` lists
    /// (default: `0` succeeds, everything else is a permanent failure).
    pub fn get_error_code(&self, code: i32) -> CommandOutcome {
        if code == 0 || self.success_codes.as_ref().is_some_and(|c| c.contains(&code)) {
            CommandOutcome::Success
        } else if self.temporary_fail_codes.as_ref().is_some_and(|c| c.contains(&code)) {
            CommandOutcome::TemporaryFailure
        } else {
            CommandOutcome::PermanentFailure
        }
    }

    pub fn has_stdout_output(&self) -> bool {
        self.stdout.is_some()
    }

    pub fn has_stderr_output(&self) -> bool {
        self.stderr.is_some()
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CommandOutcome {
    Success,
    TemporaryFailure,
    PermanentFailure,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum Argument {
    String(String),
    Binding(crate::inputs::CommandLineBinding),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum Command {
    Single(String),
    Multiple(Vec<String>),
}

impl Default for Command {
    fn default() -> Self {
        Command::Single(String::new())
    }
}

impl Command {
    pub fn as_vec(&self) -> Vec<String> {
        match self {
            Command::Single(s) if s.is_empty() => vec![],
            Command::Single(s) => vec![s.clone()],
            Command::Multiple(v) => v.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CWLType;

    #[test]
    fn test_parse_command_line_tool() {
        let yaml = r#"
class: CommandLineTool
cwlVersion: v1.0
baseCommand: [echo]
inputs:
  message:
    type: string
    inputBinding:
      position: 1
outputs:
  out:
    type: stdout
stdout: output.txt
"#;
        let tool: CommandLineTool = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(tool.base_command, Command::Multiple(vec!["echo".to_string()]));
        assert_eq!(tool.inputs[0].id, "message");
        assert_eq!(tool.inputs[0].type_, CWLType::String);
        assert_eq!(tool.stdout.as_deref(), Some("output.txt"));
    }

    #[test]
    fn test_get_error_code_defaults() {
        let tool = CommandLineTool::default();
        assert_eq!(tool.get_error_code(0), CommandOutcome::Success);
        assert_eq!(tool.get_error_code(1), CommandOutcome::PermanentFailure);
    }

    #[test]
    fn test_get_error_code_custom() {
        let mut tool = CommandLineTool::default();
        tool.success_codes = Some(vec![2]);
        tool.temporary_fail_codes = Some(vec![3]);
        assert_eq!(tool.get_error_code(2), CommandOutcome::Success);
        assert_eq!(tool.get_error_code(3), CommandOutcome::TemporaryFailure);
        assert_eq!(tool.get_error_code(4), CommandOutcome::PermanentFailure);
    }

    #[test]
    fn test_display_roundtrips_through_yaml() {
        let tool = CommandLineTool::default().with_base_command(Command::Single("ls".to_string()));
        let rendered = tool.to_string();
        let reparsed: CommandLineTool = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(reparsed.base_command, tool.base_command);
    }
}
