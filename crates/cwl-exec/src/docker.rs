//! Container wrapping (§4.6): renders the `docker run ...` prefix a
//! `DockerRequirement` would add in front of the materialized command.
//! This crate never shells out to an actual container engine: the inspector
//! reports what *would* run, it does not run it.

use crate::command::MaterializedCommand;
use crate::platform::Platform;
use crate::runtime::Runtime;
use commonwl::requirements::DockerRequirement;
use commonwl::types::DefaultValue;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEngine {
    Docker,
    Podman,
}

impl ContainerEngine {
    fn binary(self) -> &'static str {
        match self {
            ContainerEngine::Docker => "docker",
            ContainerEngine::Podman => "podman",
        }
    }
}

#[cfg(unix)]
fn user_flag() -> String {
    format!("--user={}:{}", nix::unistd::getuid().as_raw(), nix::unistd::getgid().as_raw())
}

#[cfg(not(unix))]
fn user_flag() -> String {
    "--user=0:0".to_string()
}

/// Every `File`/`Directory` input mounted read-only into the container, in
/// declaration order: `(host path, basename)`.
fn input_mounts(inputs: &HashMap<String, DefaultValue>) -> Vec<(String, String)> {
    let mut mounts: Vec<(String, String)> = Vec::new();
    let mut ids: Vec<&String> = inputs.keys().collect();
    ids.sort();
    for id in ids {
        collect_mounts(&inputs[id], &mut mounts);
    }
    mounts
}

fn collect_mounts(value: &DefaultValue, mounts: &mut Vec<(String, String)>) {
    match value {
        DefaultValue::File(file) => {
            if let Some(path) = &file.path {
                let basename = file.basename.clone().unwrap_or_else(|| path.clone());
                mounts.push((path.clone(), basename));
            }
        }
        DefaultValue::Directory(dir) => {
            if let Some(path) = &dir.path {
                let basename = dir.basename.clone().unwrap_or_else(|| path.clone());
                mounts.push((path.clone(), basename));
            }
        }
        DefaultValue::Array(items) => {
            for item in items {
                collect_mounts(item, mounts);
            }
        }
        DefaultValue::Record(fields) => {
            for (_, field) in fields {
                collect_mounts(field, mounts);
            }
        }
        _ => {}
    }
}

/// Prefixes `command`'s argv with the container invocation the
/// `DockerRequirement` describes (§4.6 "Container wrapping"): fixed flags
/// `-i --read-only --rm`, the resolved user, `HOME`/`TMPDIR` pointed at the
/// container workdir, the outdir/tmpdir bind mounts, one read-only mount per
/// `File`/`Directory` input under `<vardir>/lib/cwl/inputs/`, and every
/// `EnvVarRequirement` entry. Occurrences of the host outdir/per-input paths
/// in the rendered argv are rewritten to their container-side counterparts.
pub fn wrap_in_container(
    command: &MaterializedCommand,
    docker: &DockerRequirement,
    runtime: &Runtime,
    engine: ContainerEngine,
    platform: Platform,
    inputs: &HashMap<String, DefaultValue>,
) -> MaterializedCommand {
    let image = docker.docker_pull.clone().unwrap_or_else(|| "<built from dockerFile>".to_string());
    let vardir = platform.vardir();
    let container_outdir = docker.docker_output_directory.clone().unwrap_or_else(|| format!("{vardir}/spool/cwl"));
    let inputs_dir = format!("{vardir}/lib/cwl/inputs");

    let mut argv = vec![
        engine.binary().to_string(),
        "run".to_string(),
        "-i".to_string(),
        "--read-only".to_string(),
        "--rm".to_string(),
        format!("--workdir={container_outdir}"),
        format!("--env=HOME={container_outdir}"),
        "--env=TMPDIR=/tmp".to_string(),
        user_flag(),
    ];

    for (key, value) in &command.env {
        argv.push(format!("--env={key}='{value}'"));
    }

    argv.push(format!("-v {}:{container_outdir}", runtime.outdir.display()));
    argv.push(format!("-v {}:/tmp", runtime.tmpdir.display()));

    let mounts = input_mounts(inputs);
    for (host_path, basename) in &mounts {
        argv.push(format!("-v {host_path}:{inputs_dir}/{basename}:ro"));
    }

    argv.push(image);

    let outdir_str = runtime.outdir.to_string_lossy().into_owned();
    argv.extend(command.argv.iter().map(|token| {
        let mut rewritten = token.replace(&outdir_str, &container_outdir);
        for (host_path, basename) in &mounts {
            rewritten = rewritten.replace(host_path.as_str(), &format!("{inputs_dir}/{basename}"));
        }
        rewritten
    }));

    MaterializedCommand { argv, ..command.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonwl::types::File;
    use std::path::PathBuf;

    fn linux_runtime() -> Runtime {
        Runtime::derive(&[], &[], PathBuf::from("/out"), PathBuf::from("/tmp/work")).unwrap()
    }

    #[test]
    fn test_wrap_in_container_prefixes_docker_run() {
        let command = MaterializedCommand { argv: vec!["echo".to_string(), "hi".to_string()], ..Default::default() };
        let docker = DockerRequirement::from_pull("ubuntu:20.04");
        let runtime = linux_runtime();
        let wrapped = wrap_in_container(&command, &docker, &runtime, ContainerEngine::Docker, Platform::Linux, &HashMap::new());
        assert_eq!(wrapped.argv[0], "docker");
        assert!(wrapped.argv.contains(&"--read-only".to_string()));
        assert!(wrapped.argv.contains(&"--rm".to_string()));
        assert!(wrapped.argv.contains(&"ubuntu:20.04".to_string()));
        assert!(wrapped.argv.iter().any(|a| a == "--workdir=/var/spool/cwl"));
        assert!(wrapped.argv.iter().any(|a| a == "--env=HOME=/var/spool/cwl"));
        assert!(wrapped.argv.iter().any(|a| a == "--env=TMPDIR=/tmp"));
        assert!(wrapped.argv.iter().any(|a| a.starts_with("--user=")));
        assert!(wrapped.argv.iter().any(|a| a == "-v /out:/var/spool/cwl"));
        assert!(wrapped.argv.iter().any(|a| a == "-v /tmp/work:/tmp"));
        assert!(!wrapped.argv.iter().any(|a| a.contains("--net=none")));
        assert!(!wrapped.argv.iter().any(|a| a.contains("--mount=type=bind")));
    }

    #[test]
    fn test_wrap_in_container_mounts_file_inputs_read_only() {
        let command = MaterializedCommand { argv: vec!["javac".to_string(), "/out/Foo.java".to_string()], ..Default::default() };
        let docker = DockerRequirement::from_pull("java:7-jdk");
        let runtime = linux_runtime();
        let mut inputs = HashMap::new();
        let mut file = File::from_location(&"/out/Foo.java".to_string());
        file.path = Some("/out/Foo.java".to_string());
        file.basename = Some("Foo.java".to_string());
        inputs.insert("src".to_string(), DefaultValue::File(file));
        let wrapped = wrap_in_container(&command, &docker, &runtime, ContainerEngine::Docker, Platform::Linux, &inputs);
        assert!(wrapped.argv.iter().any(|a| a == "-v /out/Foo.java:/var/lib/cwl/inputs/Foo.java:ro"));
        assert!(wrapped.argv.contains(&"/var/lib/cwl/inputs/Foo.java".to_string()));
    }

    #[test]
    fn test_wrap_in_container_macos_uses_private_var() {
        let command = MaterializedCommand::default();
        let docker = DockerRequirement::from_pull("alpine");
        let runtime = linux_runtime();
        let wrapped = wrap_in_container(&command, &docker, &runtime, ContainerEngine::Docker, Platform::Macos, &HashMap::new());
        assert!(wrapped.argv.iter().any(|a| a == "--workdir=/private/var/spool/cwl"));
    }

    #[test]
    fn test_wrap_in_container_podman() {
        let command = MaterializedCommand::default();
        let docker = DockerRequirement::from_pull("alpine");
        let runtime = Runtime::derive(&[], &[], PathBuf::from("/out"), PathBuf::from("/tmp")).unwrap();
        let wrapped = wrap_in_container(&command, &docker, &runtime, ContainerEngine::Podman, Platform::Linux, &HashMap::new());
        assert_eq!(wrapped.argv[0], "podman");
    }
}
