//! Individual Group Execution
//!
//! Handles the execution of a single group including:
//! - Shell resolution
//! - `{{ output.<group> }}` parameter expansion
//! - Environment layering
//! - Live output streaming with in-memory capture

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread;

use log::{debug, error, info, trace};
use thiserror::Error;

use crate::config::Group;

use super::env::{merge_envs, process_env};
use super::output::{expand_params, OutputStore};

/// Shell used when neither the group nor `$SHELL` names one.
pub const FALLBACK_SHELL: &str = "/bin/sh";

/// Read size for streaming child output.
const CHUNK_SIZE: usize = 8 * 1024;

/// Failure of a single group.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group {group} failed to start '{shell}': {source}")]
    Spawn {
        group: String,
        shell: String,
        #[source]
        source: io::Error,
    },

    #[error("group {group} failed: {status}")]
    Exit { group: String, status: ExitStatus },

    #[error("group {group} failed while collecting output: {source}")]
    Capture {
        group: String,
        #[source]
        source: io::Error,
    },
}

impl GroupError {
    /// Name of the group that failed.
    pub fn group(&self) -> &str {
        match self {
            Self::Spawn { group, .. } | Self::Exit { group, .. } | Self::Capture { group, .. } => {
                group
            }
        }
    }
}

/// Shared, read-only inputs for every group in a run.
#[derive(Debug)]
pub struct GroupContext<'a> {
    /// Configuration-global environment overrides
    pub global_env: &'a HashMap<String, String>,
    /// Captured outputs of groups that already succeeded
    pub outputs: &'a OutputStore,
    /// Directory the process starts in (inherits the tool's when `None`)
    pub working_dir: Option<&'a PathBuf>,
    /// Log the resolved command instead of running it
    pub dry_run: bool,
}

/// Picks the shell for a group: explicit override, then `$SHELL`, then
/// [`FALLBACK_SHELL`].
pub fn resolve_shell(group_shell: Option<&str>, env_shell: Option<String>) -> String {
    group_shell
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| env_shell.filter(|s| !s.is_empty()))
        .unwrap_or_else(|| FALLBACK_SHELL.to_string())
}

/// Joins a command and its parameters with single spaces.
pub fn build_command_line(command: &str, params: &[String]) -> String {
    std::iter::once(command)
        .chain(params.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Executes a single group.
///
/// The command line is run as `<shell> -c "<command> <params...>"`.
/// Standard output and standard error are streamed to the tool's own
/// streams while being captured, interleaved, into one buffer.
///
/// # Returns
///
/// * `Ok(String)` - Captured output. It has also been recorded in the
///   output store under the group's name.
/// * `Err(GroupError)` - The process failed to start or exited non-zero.
///   Nothing is recorded.
///
/// Captured bytes are decoded as UTF-8 with invalid sequences replaced by
/// U+FFFD, so stored output and its substitutions are not byte-exact for
/// binary output.
pub fn run_group(group: &Group, ctx: &GroupContext<'_>) -> Result<String, GroupError> {
    let shell = resolve_shell(group.shell.as_deref(), std::env::var("SHELL").ok());

    let outputs = ctx.outputs.snapshot();
    let expanded: Vec<String> = group
        .params
        .iter()
        .map(|param| expand_params(param, &outputs))
        .collect();

    let command_line = build_command_line(&group.command, &expanded);

    if ctx.dry_run {
        info!("[DRY RUN] Group: {}", group.name);
        info!("  Shell: {}", shell);
        info!("  Command: {}", command_line);
        if let Some(dir) = ctx.working_dir {
            info!("  Working dir: {}", dir.display());
        }
        return Ok(String::new());
    }

    let env = merge_envs(&process_env(), &[ctx.global_env, &group.env]);

    info!(
        "Running group {}: command {} {:?}",
        group.name, group.command, expanded
    );

    let captured = match execute(&group.name, &shell, &command_line, env, ctx.working_dir) {
        Ok(captured) => captured,
        Err((err, captured)) => {
            error!("Error running {}: {}", group.name, err);
            info!("Output from {}: {}", group.name, captured);
            return Err(err);
        }
    };

    trace!("Output from {}: {}", group.name, captured);
    if ctx.outputs.contains(&group.name) {
        debug!("Replacing stored output of group {}", group.name);
    }
    ctx.outputs.set(group.name.clone(), captured.clone());

    Ok(captured)
}

/// Spawns the shell and collects its output.
///
/// On failure the error is returned alongside whatever was captured.
fn execute(
    name: &str,
    shell: &str,
    command_line: &str,
    env: HashMap<OsString, OsString>,
    working_dir: Option<&PathBuf>,
) -> Result<String, (GroupError, String)> {
    let mut cmd = Command::new(shell);
    cmd.arg("-c")
        .arg(command_line)
        .env_clear()
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
        debug!("Executing in directory: {}", dir.display());
    }

    let mut child = cmd.spawn().map_err(|source| {
        (
            GroupError::Spawn {
                group: name.to_string(),
                shell: shell.to_string(),
                source,
            },
            String::new(),
        )
    })?;

    let buffer = Mutex::new(Vec::new());
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (status, read_result) = thread::scope(|scope| {
        let out_handle = stdout.map(|pipe| scope.spawn(|| tee(pipe, io::stdout(), &buffer)));
        let err_handle = stderr.map(|pipe| scope.spawn(|| tee(pipe, io::stderr(), &buffer)));

        let status = child.wait();

        let read_result = [out_handle, err_handle]
            .into_iter()
            .flatten()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(io::Error::new(io::ErrorKind::Other, "output reader panicked"))
                })
            })
            .collect::<io::Result<()>>();

        (status, read_result)
    });

    let bytes = buffer.into_inner().unwrap_or_else(PoisonError::into_inner);
    let captured = String::from_utf8_lossy(&bytes).into_owned();

    let capture_error = |source| GroupError::Capture {
        group: name.to_string(),
        source,
    };

    let status = match status {
        Ok(status) => status,
        Err(source) => return Err((capture_error(source), captured)),
    };

    if !status.success() {
        return Err((
            GroupError::Exit {
                group: name.to_string(),
                status,
            },
            captured,
        ));
    }

    if let Err(source) = read_result {
        return Err((capture_error(source), captured));
    }

    Ok(captured)
}

/// Copies `reader` to `live` chunk by chunk, appending every chunk to the
/// shared capture buffer.
///
/// Write failures on the live stream are ignored so the child never blocks
/// on a full pipe.
fn tee<R: Read, W: Write>(mut reader: R, mut live: W, buffer: &Mutex<Vec<u8>>) -> io::Result<()> {
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(&chunk[..n]);

        let _ = live.write_all(&chunk[..n]).and_then(|_| live.flush());
    }
}
