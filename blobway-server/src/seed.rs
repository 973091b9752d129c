use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blobway_store::{BlobAdapter, BlobConfig, Sublevel};

/// What a directory import loaded
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub namespaces: usize,
    pub blobs: usize,
}

/// Load a directory tree into `root`.
///
/// Every sub-directory becomes a sublevel named after it and every regular
/// file a blob whose id is its file name. Entries whose names are not UTF-8
/// are skipped.
pub async fn import_dir(root: &Sublevel, dir: &Path, config: &BlobConfig) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut pending: Vec<(PathBuf, Sublevel)> = vec![(dir.to_path_buf(), root.clone())];

    while let Some((path, store)) = pending.pop() {
        let blobs = BlobAdapter::new(store.clone(), config.clone());
        let mut entries = tokio::fs::read_dir(&path)
            .await
            .with_context(|| format!("reading seed directory {}", path.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 seed entry");
                continue;
            };
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                let child = store.sublevel(name).await?;
                report.namespaces += 1;
                pending.push((entry.path(), child));
            } else if file_type.is_file() {
                let bytes = tokio::fs::read(entry.path())
                    .await
                    .with_context(|| format!("reading seed file {}", entry.path().display()))?;
                let receipt = blobs.write(&name, bytes).await?;
                tracing::debug!(url = %blobs.url(&name), version = %receipt.version, "seeded blob");
                report.blobs += 1;
            }
        }
    }

    tracing::info!(
        dir = %dir.display(),
        namespaces = report.namespaces,
        blobs = report.blobs,
        "seed import finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobway_store::MemoryBackend;

    #[tokio::test]
    async fn imports_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("42"), b"answer").unwrap();
        std::fs::create_dir_all(dir.path().join("music/live")).unwrap();
        std::fs::write(dir.path().join("music/song.mp3"), b"ID3").unwrap();
        std::fs::write(dir.path().join("music/live/set.mp3"), b"ID3 live").unwrap();

        let root = Sublevel::new(MemoryBackend::new());
        let report = import_dir(&root, dir.path(), &BlobConfig::default()).await.unwrap();
        assert_eq!(report, SeedReport { namespaces: 2, blobs: 3 });

        let live = root.sublevel("music").await.unwrap().sublevel("live").await.unwrap();
        let blobs = BlobAdapter::new(live, BlobConfig::default());
        assert!(blobs.exists("set.mp3").await.unwrap());
        assert_eq!(blobs.url("set.mp3"), "/files/music/live/set.mp3");
    }

    #[tokio::test]
    async fn missing_dir_is_an_error() {
        let root = Sublevel::new(MemoryBackend::new());
        let err = import_dir(&root, Path::new("/definitely/not/here"), &BlobConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("reading seed directory"));
    }

    #[tokio::test]
    async fn oversized_files_fail_the_import() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.bin"), vec![0u8; 16]).unwrap();

        let root = Sublevel::new(MemoryBackend::new());
        let config = BlobConfig::default().with_max_blob_bytes(8);
        assert!(import_dir(&root, dir.path(), &config).await.is_err());
    }
}
