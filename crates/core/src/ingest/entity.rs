use serde::{Deserialize, Serialize};

/// # Summary
/// 一份待入库的原始文档。
///
/// # Invariants
/// - `body` 为读取失败时，该文档计为失败，不影响其余文档。
#[derive(Debug)]
pub struct RawDocument {
    // 文档名称（通常是文件名），仅用于日志
    pub name: String,
    pub body: std::io::Result<Vec<u8>>,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            body: Ok(body.into()),
        }
    }
}

/// # Summary
/// 一次入库运行的汇总计数。
///
/// # Invariants
/// - `total == succeeded + failed`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}
