//! Model artifact preflight checks
//!
//! The model path is validated before every build attempt so that obvious
//! problems are reported without touching the native engine at all.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::LlmError;

/// Verifies that `path` points at an existing, readable, non-empty model
/// artifact. Returns its size in bytes.
pub fn validate_artifact(path: &Path) -> Result<u64, LlmError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(LlmError::ModelNotFound(format!(
                "no model artifact at {}",
                path.display()
            )));
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(LlmError::PermissionDenied(format!(
                "{}: {}",
                path.display(),
                e
            )));
        }
        Err(e) => {
            return Err(LlmError::ModelUnreadable(format!(
                "{}: {}",
                path.display(),
                e
            )));
        }
    };

    if metadata.is_dir() {
        return Err(LlmError::ModelUnreadable(format!(
            "{} is a directory, not a model file",
            path.display()
        )));
    }

    if metadata.len() == 0 {
        return Err(LlmError::ModelUnreadable(format!(
            "{} is empty",
            path.display()
        )));
    }

    // Metadata alone doesn't prove the file is openable by this process.
    if let Err(e) = File::open(path) {
        return Err(match e.kind() {
            ErrorKind::PermissionDenied => {
                LlmError::PermissionDenied(format!("{}: {}", path.display(), e))
            }
            _ => LlmError::ModelUnreadable(format!("{}: {}", path.display(), e)),
        });
    }

    tracing::debug!(
        "model artifact at {} ({} bytes) passed preflight",
        path.display(),
        metadata.len()
    );

    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_artifact() {
        let result = validate_artifact(Path::new("/definitely/not/here/model.task"));
        assert!(matches!(result, Err(LlmError::ModelNotFound(_))));
    }

    #[test]
    fn test_empty_artifact() {
        let file = NamedTempFile::new().unwrap();
        let result = validate_artifact(file.path());
        assert!(matches!(result, Err(LlmError::ModelUnreadable(_))));
    }

    #[test]
    fn test_directory_is_not_an_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate_artifact(dir.path());
        assert!(matches!(result, Err(LlmError::ModelUnreadable(_))));
    }

    #[test]
    fn test_valid_artifact() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"model weights").unwrap();
        file.flush().unwrap();

        let size = validate_artifact(file.path()).unwrap();
        assert_eq!(size, "model weights".len() as u64);
    }
}
