use crate::snapshot::error::NormalizeError;
use crate::store::error::StoreError;
use thiserror::Error;

/// # Summary
/// 入库过程中的错误。
///
/// # Invariants
/// - `Read`、`Input` 与非连接类的 `Store` 只影响单个文档，由驱动器计数后跳过。
/// - `Store(StoreError::Connection)` 与 `Source` 会终止整次运行。
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Cannot read document: {0}")]
    Read(String),
    #[error(transparent)]
    Input(#[from] NormalizeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Cannot enumerate documents: {0}")]
    Source(String),
}

impl IngestError {
    /// 是否必须终止整次入库运行。
    pub fn is_fatal(&self) -> bool {
        match self {
            IngestError::Store(e) => e.is_connection(),
            IngestError::Source(_) => true,
            IngestError::Read(_) | IngestError::Input(_) => false,
        }
    }
}
