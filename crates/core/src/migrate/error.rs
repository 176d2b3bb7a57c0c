use crate::migrate::entity::Table;
use crate::store::error::StoreError;
use thiserror::Error;

/// # Summary
/// 迁移错误枚举。
///
/// # Invariants
/// - 所有变体对一次迁移都是致命的：进行中的批次回滚，剩余批次与阶段不再执行。
#[derive(Error, Debug)]
pub enum MigrateError {
    // 任一端存储的读写或连接失败
    #[error(transparent)]
    Store(#[from] StoreError),
    // 源库中的值无法转换为目标库类型
    #[error("Cannot translate {table}.{column} = {value:?} (row {key})")]
    Translate {
        table: Table,
        key: String,
        column: &'static str,
        value: String,
    },
    // 迁移参数非法
    #[error("Invalid migration config: {0}")]
    Config(String),
}
