use std::io::{Read, Seek};
use std::process::{Command, ExitStatus};

use thiserror::Error;

/// Trailing stderr bytes kept for error messages; avoids pathological output.
const MAX_STDERR_BYTES: u16 = 1024;

/// A failed external tool invocation.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error capturing output of {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed: {status}\n{stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{program} produced invalid UTF-8 output")]
    Utf8 {
        program: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Helpers intended for [`std::process::Command`].
pub trait CommandRun {
    /// Execute the child process, returning an error if it exits unsuccessfully.
    fn run(&mut self) -> Result<(), CommandError>;

    /// Execute the child process and capture its stdout as a string.
    fn run_get_string(&mut self) -> Result<String, CommandError>;
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

fn last_utf8_content_from_file(mut f: std::fs::File) -> String {
    let size = f
        .metadata()
        .map_err(|e| {
            tracing::warn!("failed to fstat: {e}");
        })
        .map(|m| m.len().try_into().unwrap_or(u16::MAX))
        .unwrap_or(0);
    let size = size.min(MAX_STDERR_BYTES);
    let mut buf = Vec::with_capacity(size.into());
    match f
        .seek(std::io::SeekFrom::End(-i64::from(size)))
        .and_then(|_| f.read_to_end(&mut buf))
    {
        Ok(_) => String::from_utf8_lossy(&buf).trim_end().to_owned(),
        Err(e) => {
            tracing::warn!("failed seek+read: {e}");
            "<failed to read stderr>".into()
        }
    }
}

impl CommandRun for Command {
    fn run(&mut self) -> Result<(), CommandError> {
        let program = program_name(self);
        let io_err = |source| CommandError::Io {
            program: program.clone(),
            source,
        };
        let stderr = tempfile::tempfile().map_err(io_err)?;
        self.stderr(stderr.try_clone().map_err(io_err)?);
        tracing::trace!("exec: {self:?}");
        let status = self.status().map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;
        if status.success() {
            return Ok(());
        }
        Err(CommandError::Failed {
            program,
            status,
            stderr: last_utf8_content_from_file(stderr),
        })
    }

    fn run_get_string(&mut self) -> Result<String, CommandError> {
        let program = program_name(self);
        let io_err = |source| CommandError::Io {
            program: program.clone(),
            source,
        };
        let mut stdout = tempfile::tempfile().map_err(io_err)?;
        self.stdout(stdout.try_clone().map_err(io_err)?);
        self.run()?;
        let mut buf = Vec::new();
        stdout
            .seek(std::io::SeekFrom::Start(0))
            .and_then(|_| stdout.read_to_end(&mut buf))
            .map_err(io_err)?;
        String::from_utf8(buf).map_err(|source| CommandError::Utf8 { program, source })
    }
}
