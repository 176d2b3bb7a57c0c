use stockdb_core::ingest::entity::RawDocument;
use stockdb_core::ingest::error::IngestError;
use std::path::{Path, PathBuf};

/// # Summary
/// 目录下全部 `*.json` 文档，按文件名排序，逐个惰性读取。
///
/// # Invariants
/// - 列目录失败时整体报错；单个文件读取失败只体现在该文档的 `body` 上。
#[derive(Debug)]
pub struct DirectorySource {
    files: Vec<PathBuf>,
}

impl DirectorySource {
    /// 扫描目录（不递归）。
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, IngestError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| IngestError::Source(format!("{}: {}", dir.display(), e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| IngestError::Source(format!("{}: {}", dir.display(), e)))?
                .path();
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn read_document(path: PathBuf) -> RawDocument {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    RawDocument {
        name,
        body: std::fs::read(&path),
    }
}

impl IntoIterator for DirectorySource {
    type Item = RawDocument;
    type IntoIter = std::iter::Map<std::vec::IntoIter<PathBuf>, fn(PathBuf) -> RawDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.files
            .into_iter()
            .map(read_document as fn(PathBuf) -> RawDocument)
    }
}
