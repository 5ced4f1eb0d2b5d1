use commonwl::types::CWLType;
use commonwl::CWLDocument;

/// `list` (§6): predicts, for each declared output, the file or value it
/// will resolve to once the document runs — without actually running it.
pub fn list(doc: &CWLDocument) -> anyhow::Result<Vec<String>> {
    match doc {
        CWLDocument::CommandLineTool(tool) => Ok(tool
            .outputs
            .iter()
            .map(|output| {
                let prediction = match output.type_ {
                    CWLType::Stdout => tool.stdout.clone().unwrap_or_else(|| "unresolved (no stdout filename)".to_string()),
                    CWLType::Stderr => tool.stderr.clone().unwrap_or_else(|| "unresolved (no stderr filename)".to_string()),
                    _ => match &output.output_binding {
                        Some(binding) if binding.glob.is_some() => binding.glob.clone().unwrap(),
                        Some(binding) if binding.output_eval.is_some() => format!("evaluated: {}", binding.output_eval.as_ref().unwrap()),
                        _ => "unresolved (depends on execution)".to_string(),
                    },
                };
                format!("outputs.{}: {prediction}", output.id)
            })
            .collect()),
        CWLDocument::ExpressionTool(tool) => Ok(tool
            .outputs
            .iter()
            .map(|output| format!("outputs.{}: cwl.output.json#{}", output.id, output.id))
            .collect()),
        CWLDocument::Workflow(workflow) => Ok(workflow
            .outputs
            .iter()
            .map(|output| match &output.output_source {
                Some(source) => format!("outputs.{}: {source}", output.id),
                None => format!("outputs.{}: unresolved (no outputSource)", output.id),
            })
            .collect()),
    }
}
