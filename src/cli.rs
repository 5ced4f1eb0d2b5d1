use clap::Parser;
use std::path::PathBuf;

/// Inspects CWL v1.0 tools and workflows: resolves schema, evaluates
/// expressions, and materializes the command line that would execute a
/// tool.
#[derive(Parser, Debug)]
#[command(name = "cwl-inspect", version, about)]
pub struct Cli {
    /// Raise the logger to Debug (default: Info).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub inspect: InspectArgs,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Path to the CWL document to inspect, or `-` to read it from stdin.
    pub cwl: PathBuf,

    /// What to report: `.path.into.document`, `keys(.path)`, `commandline`,
    /// or `list`.
    pub query: String,

    /// Job file (YAML or JSON) supplying input values.
    #[arg(short = 'i', long = "input")]
    pub job_file: Option<PathBuf>,

    /// Working directory a materialized command would run in.
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Scratch directory a materialized command would use.
    #[arg(long)]
    pub tmpdir: Option<PathBuf>,

    /// Skip expression evaluation: report the document as loaded, without
    /// resolving `$(...)`/`${...}` fields.
    #[arg(long)]
    pub without_preprocess: bool,

    /// Render the result as JSON instead of YAML.
    #[arg(long, conflicts_with = "yaml")]
    pub json: bool,

    /// Render the result as YAML (the default).
    #[arg(long)]
    pub yaml: bool,
}
