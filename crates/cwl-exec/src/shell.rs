//! Shell wrapping (§4.6): wraps a materialized argv in the `<shell> -c
//! '<cmd>'` invocation a tool actually runs under, with the `cd ~ &&` /
//! `env HOME=.. TMPDIR=..` preamble used outside a container and the stream
//! redirections appended after the quoted command.

use crate::command::MaterializedCommand;
use crate::platform::Platform;
use crate::runtime::Runtime;

fn escape_single_quotes(text: &str) -> String {
    text.replace('\'', r"'\''")
}

/// Renders `command`'s argv as a single `sh -c '...'` invocation. `shell`
/// is always `/bin/sh` when `in_container` is true (Linux and macOS
/// containers alike run a Linux userland); otherwise it's
/// `platform.host_shell()`. Outside a container, `cd ~ &&` is prepended to
/// the quoted command and an `env HOME=<outdir> TMPDIR=<tmpdir>` preamble is
/// emitted ahead of the shell invocation; inside one, the container already
/// sets both, so neither appears.
pub fn assemble_shell_command(command: &MaterializedCommand, runtime: &Runtime, platform: Platform, in_container: bool) -> MaterializedCommand {
    let shell = if in_container { "/bin/sh" } else { platform.host_shell() };

    let inner = command.argv.join(" ");
    let inner = if in_container { inner } else { format!("cd ~ && {inner}") };
    let quoted = format!("'{}'", escape_single_quotes(&inner));

    let mut argv = Vec::new();
    if !in_container {
        argv.push(format!("env HOME={} TMPDIR={}", runtime.outdir.display(), runtime.tmpdir.display()));
    }
    argv.push(shell.to_string());
    argv.push("-c".to_string());
    argv.push(quoted);

    if let Some(stdin) = &command.stdin {
        argv.push(format!("< {stdin}"));
    }
    if let Some(stdout) = &command.stdout {
        argv.push(format!("> {}/{}", runtime.outdir.display(), stdout));
    }
    if let Some(stderr) = &command.stderr {
        argv.push(format!("2> {}/{}", runtime.outdir.display(), stderr));
    }

    MaterializedCommand { argv, uses_shell: true, ..command.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn runtime() -> Runtime {
        Runtime { outdir: PathBuf::from("/out"), tmpdir: PathBuf::from("/tmp/work"), cores: 1, ram_mib: 1024, tmpdir_size_mib: 1024, outdir_size_mib: 1024 }
    }

    #[test]
    fn test_assemble_shell_command_outside_container() {
        let command = MaterializedCommand { argv: vec!["echo".to_string(), "'hi'".to_string()], ..Default::default() };
        let wrapped = assemble_shell_command(&command, &runtime(), Platform::Linux, false);
        assert_eq!(wrapped.argv[0], "env HOME=/out TMPDIR=/tmp/work");
        assert_eq!(wrapped.argv[1], "/bin/sh");
        assert_eq!(wrapped.argv[2], "-c");
        assert_eq!(wrapped.argv[3], "'cd ~ && echo '\\''hi'\\'''");
    }

    #[test]
    fn test_assemble_shell_command_in_container_uses_posix_shell() {
        let command = MaterializedCommand { argv: vec!["echo".to_string()], ..Default::default() };
        let wrapped = assemble_shell_command(&command, &runtime(), Platform::Macos, true);
        assert_eq!(wrapped.argv[0], "/bin/sh");
        assert!(!wrapped.argv.iter().any(|a| a.starts_with("env HOME=")));
        assert!(!wrapped.argv.iter().any(|a| a.contains("cd ~")));
    }

    #[test]
    fn test_assemble_shell_command_macos_host_uses_bash() {
        let command = MaterializedCommand { argv: vec!["echo".to_string()], ..Default::default() };
        let wrapped = assemble_shell_command(&command, &runtime(), Platform::Macos, false);
        assert_eq!(wrapped.argv[1], "/bin/bash");
    }

    #[test]
    fn test_assemble_shell_command_appends_redirections() {
        let command = MaterializedCommand {
            argv: vec!["cowsay".to_string()],
            stdin: Some("in.txt".to_string()),
            stdout: Some("out.txt".to_string()),
            stderr: Some("err.txt".to_string()),
            ..Default::default()
        };
        let wrapped = assemble_shell_command(&command, &runtime(), Platform::Linux, false);
        assert!(wrapped.argv.contains(&"< in.txt".to_string()));
        assert!(wrapped.argv.contains(&"> /out/out.txt".to_string()));
        assert!(wrapped.argv.contains(&"2> /out/err.txt".to_string()));
    }
}
