mod cli;
mod commands;
mod logger;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use commands::{document_snapshot, parse_query, Query};
use log::{error, LevelFilter};
use logger::LOGGER;
use std::io::Read;
use std::path::Path;
use std::process::exit;

fn main() {
    if let Err(e) = run() {
        error!("{e}");
        exit(1);
    }
}

fn run() -> Result<()> {
    let args = Cli::parse();
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info }))
        .unwrap();

    let inspect = args.inspect;
    let reads_stdin = inspect.cwl == Path::new("-");
    let doc_dir = if reads_stdin {
        std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."))
    } else {
        inspect.cwl.parent().unwrap_or_else(|| Path::new(".")).to_path_buf()
    };
    let doc = if reads_stdin {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw).context("failed to read CWL document from stdin")?;
        commonwl::load_document_str(&raw, &doc_dir, &inspect.cwl).context("failed to load document from stdin")?
    } else {
        commonwl::load_document(&inspect.cwl).with_context(|| format!("failed to load {}", inspect.cwl.display()))?
    };
    let query = parse_query(&inspect.query)?;
    let preprocess = !inspect.without_preprocess;

    let rendered = match query {
        Query::Commandline => {
            let command = commands::commandline::commandline(&doc, &doc_dir, inspect.job_file.as_ref(), inspect.outdir, inspect.tmpdir, preprocess)?;
            serde_yaml::to_value(&CommandView::from(command))?
        }
        Query::List => {
            let ids = commands::list::list(&doc)?;
            serde_yaml::to_value(ids)?
        }
        Query::Walk(path) => {
            let snapshot = document_snapshot(&doc)?;
            commands::walk::walk(&snapshot, &path)?
        }
        Query::Keys(path) => {
            let snapshot = document_snapshot(&doc)?;
            serde_yaml::to_value(commands::keys::keys(&snapshot, &path)?)?
        }
    };

    if inspect.json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        print!("{}", serde_yaml::to_string(&rendered)?);
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct CommandView {
    argv: Vec<String>,
    stdin: Option<String>,
    stdout: Option<String>,
    stderr: Option<String>,
    env: std::collections::HashMap<String, String>,
    uses_shell: bool,
}

impl From<cwl_execution::MaterializedCommand> for CommandView {
    fn from(command: cwl_execution::MaterializedCommand) -> Self {
        Self {
            argv: command.argv,
            stdin: command.stdin,
            stdout: command.stdout,
            stderr: command.stderr,
            env: command.env,
            uses_shell: command.uses_shell,
        }
    }
}
