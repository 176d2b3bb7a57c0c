use crate::normalize::normalize_bytes;
use stockdb_core::ingest::entity::{IngestReport, RawDocument};
use stockdb_core::ingest::error::IngestError;
use stockdb_core::store::port::SnapshotStore;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 每处理多少份文档输出一次进度
const PROGRESS_EVERY: u64 = 50;

/// # Summary
/// 入库驱动器：逐份文档归一化并写入快照存储。
///
/// # Invariants
/// - 单份文档的读取、解析、写入失败只计数，不中断后续文档。
/// - 连接丢失立即终止运行，不再尝试后续文档。
/// - 不重试。
pub struct Ingestor {
    store: Arc<dyn SnapshotStore>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// # Summary
    /// 处理单份文档。
    ///
    /// # Logic
    /// 1. 取出文档内容，读取失败返回 `IngestError::Read`。
    /// 2. 解析并归一化。
    /// 3. 整体替换该 symbol 的数据。
    ///
    /// # Returns
    /// * 成功时返回写入的 symbol。
    pub async fn ingest_one(&self, document: RawDocument) -> Result<String, IngestError> {
        let body = document
            .body
            .map_err(|e| IngestError::Read(e.to_string()))?;
        let snapshot = normalize_bytes(&body)?;
        self.store.replace_snapshot(&snapshot).await?;
        Ok(snapshot.stock.symbol)
    }

    /// # Summary
    /// 处理一批文档并汇总计数。
    ///
    /// # Logic
    /// 1. 依来源给出的顺序逐份调用 `ingest_one`。
    /// 2. 失败的文档记录告警并计入 `failed`。
    /// 3. 连接类错误记录后立即返回，剩余文档不再处理。
    /// 4. 每 50 份输出一次进度，结束时输出汇总。
    ///
    /// # Arguments
    /// * `documents` - 任意文档来源，例如 `DirectorySource`。
    ///
    /// # Returns
    /// * `IngestReport`，其中 `total == succeeded + failed`；连接丢失时返回该错误。
    pub async fn ingest<I>(&self, documents: I) -> Result<IngestReport, IngestError>
    where
        I: IntoIterator<Item = RawDocument>,
    {
        let mut report = IngestReport::default();

        for document in documents {
            let name = document.name.clone();
            report.total += 1;
            match self.ingest_one(document).await {
                Ok(_) => report.succeeded += 1,
                Err(e) if e.is_fatal() => {
                    report.failed += 1;
                    error!(
                        "Ingestion aborted at {} after {} documents ({} succeeded): {}",
                        name, report.total, report.succeeded, e
                    );
                    return Err(e);
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("Failed to ingest {}: {}", name, e);
                }
            }

            if report.total % PROGRESS_EVERY == 0 {
                info!(
                    "Processed {} documents ({} succeeded, {} failed)",
                    report.total, report.succeeded, report.failed
                );
            }
        }

        info!(
            "Ingestion finished: {} documents, {} succeeded, {} failed",
            report.total, report.succeeded, report.failed
        );
        Ok(report)
    }
}
