//! Reading input text and writing results
//!
//! Input comes from a file or stdin, output goes to a file or stdout. Files
//! are replaced atomically so a failed run never leaves a partial result
//! behind.

use crate::error::{CryptifyError, ErrorCategory, ErrorKind, Result};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Reads UTF-8 text from `path`, or from stdin when `path` is `None`.
///
/// A single trailing line ending (`\n` or `\r\n`) is removed.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    let bytes = match path {
        Some(path) => fs::read(path).map_err(|e| read_error(path, e))?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).map_err(|e| {
                CryptifyError::with_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to read from stdin",
                    e,
                )
            })?;
            buf
        }
    };
    let mut text = String::from_utf8(bytes).map_err(|e| {
        CryptifyError::with_source(
            ErrorCategory::User,
            ErrorKind::Io,
            "input is not valid UTF-8",
            e,
        )
    })?;
    strip_line_ending(&mut text);
    Ok(text)
}

/// Writes `contents` to `path`, or to stdout (followed by a newline) when
/// `path` is `None`.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => write_file_atomic(path, contents.as_bytes())
            .map_err(|e| e.with_context(format!("failed to write to {}", path.display()))),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", contents)
                .and_then(|()| stdout.flush())
                .map_err(|e| {
                    CryptifyError::with_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        "failed to write to stdout",
                        e,
                    )
                })
        }
    }
}

fn strip_line_ending(text: &mut String) {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
}

/// Replaces `path` with `contents` via tempfile + fsync + rename.
///
/// The file is created with mode 0o600 (read/write for owner only) on Unix systems.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        CryptifyError::with_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        CryptifyError::with_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        CryptifyError::with_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        CryptifyError::with_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync tempfile",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                CryptifyError::with_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to set tempfile permissions",
                    e,
                )
            })?;
    }

    temp_file.persist(path).map_err(|e| {
        CryptifyError::with_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

pub(crate) fn read_error(path: &Path, err: io::Error) -> CryptifyError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    CryptifyError::with_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
