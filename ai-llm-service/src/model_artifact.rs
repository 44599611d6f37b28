//! Pre-flight check for a local quantized weights file.
//!
//! When `LLM_MODEL_PATH` points at the weights the runtime serves, the file
//! must exist and carry the GGUF magic before the model is loaded.

use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error_handler::ModelArtifactError;

/// Magic bytes at offset 0 of every GGUF file.
pub const GGUF_MAGIC: [u8; 4] = *b"GGUF";

/// Verifies that `path` is a readable GGUF file.
///
/// # Errors
/// - [`ModelArtifactError::NotFound`] if nothing exists at `path`
/// - [`ModelArtifactError::NotAFile`] if `path` is a directory
/// - [`ModelArtifactError::IncompatibleFormat`] if the header is not GGUF
/// - [`ModelArtifactError::Io`] for other read failures
pub async fn verify_gguf(path: &Path) -> Result<(), ModelArtifactError> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ModelArtifactError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ModelArtifactError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if !meta.is_file() {
        return Err(ModelArtifactError::NotAFile(path.to_path_buf()));
    }

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|source| ModelArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let mut magic = [0u8; 4];
    if let Err(e) = file.read_exact(&mut magic).await {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Err(ModelArtifactError::IncompatibleFormat {
                path: path.to_path_buf(),
                reason: format!("file is only {} bytes long", meta.len()),
            });
        }
        return Err(ModelArtifactError::Io {
            path: path.to_path_buf(),
            source: e,
        });
    }

    if magic != GGUF_MAGIC {
        return Err(ModelArtifactError::IncompatibleFormat {
            path: path.to_path_buf(),
            reason: format!("expected GGUF magic, found {magic:02x?}"),
        });
    }

    debug!(path = %path.display(), bytes = meta.len(), "model file verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn accepts_gguf_header() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"GGUF\x03\x00\x00\x00rest-of-header").unwrap();
        verify_gguf(f.path()).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_legacy_ggml_and_short_files() {
        let mut legacy = tempfile::NamedTempFile::new().unwrap();
        legacy.write_all(b"tjgg\x03\x00\x00\x00").unwrap();
        assert!(matches!(
            verify_gguf(legacy.path()).await,
            Err(ModelArtifactError::IncompatibleFormat { .. })
        ));

        let mut short = tempfile::NamedTempFile::new().unwrap();
        short.write_all(b"GG").unwrap();
        assert!(matches!(
            verify_gguf(short.path()).await,
            Err(ModelArtifactError::IncompatibleFormat { .. })
        ));
    }

    #[tokio::test]
    async fn missing_path_and_directory_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            verify_gguf(&dir.path().join("llama-2-7b-chat.gguf")).await,
            Err(ModelArtifactError::NotFound(_))
        ));
        assert!(matches!(
            verify_gguf(dir.path()).await,
            Err(ModelArtifactError::NotAFile(_))
        ));
    }
}
