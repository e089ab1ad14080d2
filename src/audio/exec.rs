//! Running audio control tools
//!
//! Thin wrapper over [`std::process::Command`] that captures stdout, turns a
//! non-zero exit into a [`SwitchError::Tool`] carrying stderr, and optionally
//! enforces a deadline so a hung audio server can't hang the hotkey.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{Result, SwitchError};

/// How often to check whether a child with a deadline has exited
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Run `program` with `args` and return its stdout
///
/// # Errors
/// Returns [`SwitchError::Tool`] if the program can't be started, exits
/// unsuccessfully, or is still running when `timeout` elapses.
pub fn run(program: &str, args: &[&str], timeout: Option<Duration>) -> Result<Vec<u8>> {
    debug!("Running: {} {}", program, args.join(" "));

    let mut command = Command::new(program);
    command.args(args);

    let (success, stdout, stderr) = match timeout {
        None => {
            let output = command.output().map_err(|e| {
                SwitchError::tool(program, format!("not found or failed to start: {e}"))
            })?;
            (output.status.success(), output.stdout, output.stderr)
        }
        Some(limit) => run_with_deadline(program, &mut command, limit)?,
    };

    if !success {
        let stderr = String::from_utf8_lossy(&stderr);
        return Err(SwitchError::tool(program, format!("failed: {}", stderr.trim())));
    }

    trace!("{} returned {} bytes", program, stdout.len());
    Ok(stdout)
}

/// Run and parse stdout as UTF-8 text
///
/// # Errors
/// Same as [`run`], plus a [`SwitchError::Tool`] for non-UTF-8 output.
pub fn run_text(program: &str, args: &[&str], timeout: Option<Duration>) -> Result<String> {
    let stdout = run(program, args, timeout)?;
    String::from_utf8(stdout).map_err(|e| SwitchError::tool(program, format!("invalid output: {e}")))
}

fn run_with_deadline(
    program: &str,
    command: &mut Command,
    limit: Duration,
) -> Result<(bool, Vec<u8>, Vec<u8>)> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SwitchError::tool(program, format!("not found or failed to start: {e}")))?;

    // Drain pipes on their own threads; pw-dump output easily fills a pipe buffer
    let stdout_reader = drain(&mut child, true);
    let stderr_reader = drain(&mut child, false);

    let deadline = Instant::now() + limit;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SwitchError::tool(
                    program,
                    format!("timed out after {}ms", limit.as_millis()),
                ));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(SwitchError::tool(program, format!("wait failed: {e}")));
            }
        }
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();
    Ok((status.success(), stdout, stderr))
}

fn drain(child: &mut Child, stdout: bool) -> thread::JoinHandle<Vec<u8>> {
    let pipe: Option<Box<dyn Read + Send>> = if stdout {
        child.stdout.take().map(|p| Box::new(p) as Box<dyn Read + Send>)
    } else {
        child.stderr.take().map(|p| Box::new(p) as Box<dyn Read + Send>)
    };

    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}
