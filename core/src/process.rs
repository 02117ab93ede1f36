//! Subprocess spawning for external engines

use crate::error::{EngineError, Error};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};

/// Line reader over a child's output stream
pub type LineReader<R> = Split<BufReader<R>>;

/// Build a command for an external tool
///
/// Stdout and stderr are piped, stdin is closed, and the child is killed when
/// its handle is dropped. `index_env` is added on top of the inherited
/// environment.
pub fn tool_command<I, S>(
    program: &Path,
    args: I,
    index_env: Option<(&str, PathBuf)>,
) -> tokio::process::Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some((var, value)) = index_env {
        cmd.env(var, value);
    }
    cmd
}

/// Map a spawn failure to an engine error
pub fn spawn_error(tool: &str, install_url: Option<&str>, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        EngineError::NotFound {
            tool: tool.to_string(),
            install_url: install_url.map(str::to_string),
        }
        .into()
    } else {
        EngineError::Spawn {
            tool: tool.to_string(),
            message: err.to_string(),
        }
        .into()
    }
}

/// Split a stream on newlines
pub fn lines<R: AsyncRead + Unpin>(stream: R) -> LineReader<R> {
    BufReader::new(stream).split(b'\n')
}

/// Decode one raw line, dropping a trailing carriage return
pub fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Display name of an executable for messages
pub fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string_lossy().into_owned())
}
