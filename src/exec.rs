//! External command execution
//!
//! Every helper waits for the child to exit and turns a non-zero status into
//! `SetupError::CommandExit`. No timeouts are imposed here; the CI job limit
//! bounds the run.

use crate::error::{SetupError, SetupResult};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

/// Max number of output lines kept in a failure message.
const ERROR_TAIL_LINES: usize = 20;

/// Render a command line for logs and error messages
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep the last `ERROR_TAIL_LINES` lines of captured output.
fn output_tail(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Run a command, echoing its output line by line.
pub async fn run(program: &str, args: &[&str]) -> SetupResult<()> {
    run_inner(program, args, None).await
}

/// Run a command with `input` written to its stdin.
pub async fn run_with_input(program: &str, args: &[&str], input: &[u8]) -> SetupResult<()> {
    run_inner(program, args, Some(input)).await
}

async fn run_inner(program: &str, args: &[&str], input: Option<&[u8]>) -> SetupResult<()> {
    let cmdline = command_line(program, args);
    debug!("Executing: {}", cmdline);

    let mut child = Command::new(program)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SetupError::command_failed(&cmdline, e))?;

    if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
        stdin
            .write_all(input)
            .await
            .map_err(|e| SetupError::io(format!("writing stdin of {}", cmdline), e))?;
        // Closing stdin lets the child see EOF.
        drop(stdin);
    }

    let output = stream_child_output(&mut child, &|line| println!("{}", line)).await;

    let status = child
        .wait()
        .await
        .map_err(|e| SetupError::command_failed(&cmdline, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(SetupError::command_exit(
            cmdline,
            status.code().unwrap_or(-1),
            output_tail(&output),
        ))
    }
}

/// Run a command with all output discarded; only the exit status matters.
pub async fn run_silent(program: &str, args: &[&str]) -> SetupResult<()> {
    let cmdline = command_line(program, args);
    debug!("Executing silently: {}", cmdline);

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| SetupError::command_failed(&cmdline, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(SetupError::command_exit(
            cmdline,
            status.code().unwrap_or(-1),
            "",
        ))
    }
}

/// Run a command and return its stdout.
pub async fn output(program: &str, args: &[&str]) -> SetupResult<String> {
    let cmdline = command_line(program, args);
    debug!("Executing: {}", cmdline);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| SetupError::command_failed(&cmdline, e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(SetupError::command_exit(
            cmdline,
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr),
        ))
    }
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines for error reporting.
async fn stream_child_output(
    child: &mut Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> Vec<String> {
    let mut all_output = Vec::new();
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return all_output;
    };

    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stdout_reader = BufReader::new(stdout).lines();

    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stderr_done = true,
                }
            }
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stdout_done = true,
                }
            }
        }
    }

    all_output
}
