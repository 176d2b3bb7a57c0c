use thiserror::Error;

/// # Summary
/// 存储层错误枚举，区分连接失败与读写失败。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - `Connection` 表示无法建立或维持连接，对任何一次运行都是致命的。
#[derive(Error, Debug)]
pub enum StoreError {
    /// 无法建立或维持数据库连接
    #[error("Connection error: {0}")]
    Connection(String),
    /// 写入失败（约束冲突或 I/O 错误）
    #[error("Write error: {0}")]
    Write(String),
    /// 读取失败
    #[error("Read error: {0}")]
    Read(String),
    /// 初始化库或表结构失败
    #[error("Initialization error: {0}")]
    Init(String),
}

impl StoreError {
    /// 是否属于连接类错误。
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}
