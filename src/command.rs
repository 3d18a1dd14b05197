use std::{
    io,
    process::{Command, ExitStatus, Stdio},
    thread,
};

use log::{error, info, warn};

pub trait CommandRunner {
    fn run(&self, command_line: &str);
}

/// Runs commands through the system shell in the background.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommand;

impl CommandRunner for ShellCommand {
    fn run(&self, command_line: &str) {
        let line = command_line.to_string();
        let spawned = thread::Builder::new()
            .name("alarm-command".to_string())
            .spawn(move || match run_shell(&line) {
                Ok(status) if status.success() => info!("alarm command {line:?} finished"),
                Ok(status) => warn!("alarm command {line:?} exited with {status}"),
                Err(err) => error!("couldn't run alarm command {line:?}: {err}"),
            });
        if let Err(err) = spawned {
            error!("couldn't start alarm command {command_line:?}: {err}");
        }
    }
}

/// output is discarded, it would be drawn over the clock
pub fn run_shell(command_line: &str) -> io::Result<ExitStatus> {
    info!("running alarm command {command_line:?}");
    shell()
        .arg(command_line)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
}

#[cfg(unix)]
fn shell() -> Command {
    let mut command = Command::new("sh");
    command.arg("-c");
    command
}

#[cfg(windows)]
fn shell() -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C");
    command
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn exit_status_is_reported() {
        assert!(run_shell("true").unwrap().success());
        assert_eq!(run_shell("exit 3").unwrap().code(), Some(3));
    }

    #[test]
    fn background_command_runs() {
        let dir = tempfile::tempdir().unwrap();
        let done = dir.path().join("done.txt");
        ShellCommand.run(&format!("touch '{}'", done.display()));
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while !done.exists() && std::time::Instant::now() < deadline {
            thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(done.exists());
    }
}
