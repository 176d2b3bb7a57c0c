use super::error::StoreError;
use crate::migrate::entity::{PriceKey, PriceRecord, PriceRow, StockRecord, StockRow, Table};
use crate::snapshot::entity::Snapshot;
use async_trait::async_trait;

/// # Summary
/// 快照写入接口（入库侧的 Upsert 引擎）。
///
/// # Invariants
/// - 每次调用对单个 symbol 是一个完整的持久化单元：
///   主记录覆盖、旧采样删除、新采样写入要么全部生效，要么全部不生效。
/// - 不同 symbol 之间互不影响，也不保证跨 symbol 的原子性。
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// # Summary
    /// 用一份快照整体替换该 symbol 的全部数据。
    ///
    /// # Logic
    /// 1. 以主键 `symbol` 覆盖 `stocks` 中的主记录（含全部非主键列）。
    /// 2. 删除该 symbol 在 `price_data` 中的全部旧采样。
    /// 3. 批量写入新采样（为空时跳过）。
    /// 4. 一次性提交。
    ///
    /// # Arguments
    /// * `snapshot`: 归一化后的快照。
    ///
    /// # Returns
    /// 成功返回 Ok，任何约束或 I/O 失败原样返回 `StoreError`。
    async fn replace_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// # Summary
/// 迁移源接口，负责按确定顺序读出两张表。
#[async_trait]
pub trait MigrationSource: Send + Sync {
    /// # Summary
    /// 读出全部主记录，按 `symbol` 升序。
    ///
    /// # Returns
    /// 主记录列表（数值列保持文本形式）。
    async fn load_stocks(&self) -> Result<Vec<StockRecord>, StoreError>;

    /// # Summary
    /// 按 (`symbol`, `timestamp`) 升序分页读取价格采样。
    ///
    /// # Logic
    /// 返回严格位于 `after` 之后的至多 `limit` 行；`after` 为 `None` 时从头开始。
    ///
    /// # Arguments
    /// * `after`: 上一页最后一行的位置。
    /// * `limit`: 本页最大行数。
    ///
    /// # Returns
    /// 空列表表示已读完。
    async fn price_page(
        &self,
        after: Option<&PriceKey>,
        limit: usize,
    ) -> Result<Vec<PriceRecord>, StoreError>;

    /// 统计表行数。
    async fn count_rows(&self, table: Table) -> Result<u64, StoreError>;
}

/// # Summary
/// 迁移目标接口，每个写入方法都是一个独立提交的批次。
///
/// # Invariants
/// - 批次写入失败时该批次已回滚，之前提交的批次保持不变。
#[async_trait]
pub trait MigrationTarget: Send + Sync {
    /// # Summary
    /// 以"冲突即更新"语义写入一批主记录并提交。
    ///
    /// # Logic
    /// 主键冲突时，用传入值覆盖全部非主键列。
    async fn upsert_stocks(&self, batch: &[StockRow]) -> Result<(), StoreError>;

    /// 清空目标库的 `price_data` 并提交。
    async fn clear_prices(&self) -> Result<(), StoreError>;

    /// 以普通插入写入一批价格采样并提交。
    async fn insert_prices(&self, batch: &[PriceRow]) -> Result<(), StoreError>;

    /// 统计表行数。
    async fn count_rows(&self, table: Table) -> Result<u64, StoreError>;
}
