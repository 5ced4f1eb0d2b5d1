use anyhow::{anyhow, Context, Result};
use commonwl::inputs::CommandInputParameter;
use commonwl::requirements::Requirement;
use commonwl::types::DefaultValue;
use commonwl::CWLDocument;
use cwl_execution::docker::{wrap_in_container, ContainerEngine};
use cwl_execution::environment::{collect_env_vars, collect_inputs};
use cwl_execution::expression::evaluate_expression;
use cwl_execution::shell::assemble_shell_command;
use cwl_execution::{build_command, coerce_inputs, MaterializedCommand, Platform, Runtime, RuntimeEnvironment};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// `commandline` (§6): for a `CommandLineTool`, resolves a job against its
/// inputs, renders the argv, wraps it in the `<shell> -c '...'` invocation
/// it actually runs under, and prefixes a `docker run ...` preamble when a
/// `DockerRequirement` applies; for an `ExpressionTool`, renders the
/// `echo '...' > cwl.output.json` shell line that would materialize its
/// evaluated output object.
pub fn commandline(
    doc: &CWLDocument,
    doc_dir: &Path,
    job_file: Option<&PathBuf>,
    outdir: Option<PathBuf>,
    tmpdir: Option<PathBuf>,
    preprocess: bool,
) -> Result<MaterializedCommand> {
    let platform = Platform::detect()?;

    match doc {
        CWLDocument::CommandLineTool(tool) => {
            let (coerced, environment, runtime) = resolve_environment(tool.inputs.as_slice(), &tool.requirements, &tool.hints, doc_dir, job_file, outdir, tmpdir)?;

            let command = build_command(tool, &coerced, &environment, preprocess)?;
            let docker = tool.get_docker_requirement();
            let command = assemble_shell_command(&command, &runtime, platform, docker.is_some());
            let command = match docker {
                Some(docker) => wrap_in_container(&command, docker, &runtime, ContainerEngine::Docker, platform, &coerced),
                None => command,
            };

            Ok(command)
        }
        CWLDocument::ExpressionTool(tool) => {
            let (_, environment, _) = resolve_environment(tool.inputs.as_slice(), &tool.requirements, &tool.hints, doc_dir, job_file, outdir, tmpdir)?;

            let result = if preprocess {
                evaluate_expression(&tool.expression, &environment, tool.has_inline_javascript_requirement()).context("failed to evaluate ExpressionTool body")?
            } else {
                serde_json::Value::String(tool.expression.clone())
            };
            let rendered = serde_json::to_string(&result)?;

            Ok(MaterializedCommand {
                argv: vec!["echo".to_string(), rendered, ">".to_string(), "cwl.output.json".to_string()],
                uses_shell: true,
                ..Default::default()
            })
        }
        CWLDocument::Workflow(_) => Err(anyhow!("'commandline' only applies to a CommandLineTool or ExpressionTool")),
    }
}

#[allow(clippy::type_complexity)]
fn resolve_environment(
    declared_inputs: &[CommandInputParameter],
    requirements: &[Requirement],
    hints: &[Requirement],
    doc_dir: &Path,
    job_file: Option<&PathBuf>,
    outdir: Option<PathBuf>,
    tmpdir: Option<PathBuf>,
) -> Result<(HashMap<String, DefaultValue>, RuntimeEnvironment, Runtime)> {
    let job_values = match job_file {
        Some(path) => load_job_file(path)?,
        None => HashMap::new(),
    };

    let resolved = collect_inputs(declared_inputs, &job_values)?;
    let coerced = coerce_inputs(declared_inputs, &resolved, doc_dir)?;

    let outdir = outdir.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let tmpdir = tmpdir.unwrap_or_else(std::env::temp_dir);
    let runtime = Runtime::derive(requirements, hints, outdir, tmpdir)?;
    let env_vars = collect_env_vars(requirements, hints);
    let environment = RuntimeEnvironment::new(coerced.clone(), &runtime, env_vars);

    Ok((coerced, environment, runtime))
}

fn load_job_file(path: &Path) -> Result<HashMap<String, DefaultValue>> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("could not read job file {}", path.display()))?;
    let is_json = path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("json")).unwrap_or(false);
    if is_json {
        serde_json::from_str(&contents).with_context(|| format!("job file {} is not valid JSON", path.display()))
    } else {
        serde_yaml::from_str(&contents).with_context(|| format!("job file {} is not valid YAML", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonwl::et::ExpressionTool;
    use commonwl::outputs::CommandOutputParameter;
    use commonwl::requirements::{InlineJavascriptRequirement, Requirement};
    use commonwl::DocumentBase;
    use tempfile::tempdir;

    #[test]
    fn test_commandline_renders_expression_tool_as_echo_shell_line() {
        let tool = ExpressionTool {
            base: DocumentBase {
                class: "ExpressionTool".to_string(),
                requirements: vec![Requirement::InlineJavascriptRequirement(InlineJavascriptRequirement::default())],
                ..Default::default()
            },
            outputs: vec![CommandOutputParameter { id: "result".to_string(), ..Default::default() }],
            expression: "${return {'result': 42};}".to_string(),
        };
        let doc = CWLDocument::ExpressionTool(tool);
        let dir = tempdir().unwrap();

        let command = commandline(&doc, dir.path(), None, None, None, true).unwrap();

        assert!(command.uses_shell);
        assert_eq!(command.argv[0], "echo");
        assert!(command.argv[1].contains("\"result\":42"));
        assert_eq!(command.argv[2], ">");
        assert_eq!(command.argv[3], "cwl.output.json");
    }

    #[test]
    fn test_commandline_rejects_workflow() {
        let doc = CWLDocument::Workflow(commonwl::Workflow::default());
        let dir = tempdir().unwrap();
        assert!(commandline(&doc, dir.path(), None, None, None, true).is_err());
    }
}
