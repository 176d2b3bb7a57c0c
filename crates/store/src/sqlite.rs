use crate::dialect::Dialect;
use crate::error::{connection_err, init_err, read_err, row_count, write_err};
use crate::schema;
use async_trait::async_trait;
use sqlx::{
    Executor, QueryBuilder, Row, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};
use stockdb_core::migrate::entity::{
    PriceKey, PriceRecord, PriceRow, StockRecord, StockRow, Table,
};
use stockdb_core::snapshot::entity::Snapshot;
use stockdb_core::store::error::StoreError;
use stockdb_core::store::port::{MigrationSource, MigrationTarget, SnapshotStore};
use std::path::Path;
use tracing::debug;

const DIALECT: Dialect = Dialect::Sqlite;

const SELECT_STOCKS: &str = r#"
    SELECT symbol, company_name, exchange,
           CAST(market_cap AS TEXT) AS market_cap,
           CAST(beta AS TEXT) AS beta,
           CAST(eps AS TEXT) AS eps,
           CAST(roe AS TEXT) AS roe,
           CAST(roa AS TEXT) AS roa,
           CAST(match_price AS TEXT) AS match_price,
           CAST(changed_value AS TEXT) AS changed_value,
           CAST(changed_ratio AS TEXT) AS changed_ratio,
           CAST(total_volume AS INTEGER) AS total_volume,
           updated_at, full_data_json
    FROM stocks
    ORDER BY symbol
"#;

// `symbol`/`timestamp` 保持原始列，排序与键集比较才能直接走 (symbol, timestamp) 索引
const SELECT_PRICES: &str = r#"
    SELECT symbol,
           timestamp,
           CAST(open_price AS TEXT) AS open_price,
           CAST(high_price AS TEXT) AS high_price,
           CAST(low_price AS TEXT) AS low_price,
           CAST(close_price AS TEXT) AS close_price,
           CAST(volume AS INTEGER) AS volume
    FROM price_data
"#;

const PRICE_ORDER: &str = "ORDER BY symbol, timestamp LIMIT ?";

fn first_price_page() -> String {
    format!("{SELECT_PRICES} {PRICE_ORDER}")
}

fn next_price_page() -> String {
    format!("{SELECT_PRICES} WHERE (symbol, timestamp) > (?, ?) {PRICE_ORDER}")
}

/// SQLite 库在本次运行中扮演的角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteRole {
    /// 入库写入与迁移读取，不强制外键
    Source,
    /// 迁移写入，强制外键并建立二级索引
    Target,
}

/// 基于单个 SQLite 文件的存储。
///
/// # Summary
/// 作为源库时承担快照入库（`SnapshotStore`）与迁移读取（`MigrationSource`），
/// 作为目标库时承担迁移写入（`MigrationTarget`）。
///
/// # Invariants
/// * 连接池只有一个连接，所有操作顺序执行。
/// * 表结构由 `init_schema` 建立，打开连接时不隐式建表。
pub struct SqliteStore {
    pool: SqlitePool,
    role: SqliteRole,
}

impl SqliteStore {
    /// 打开（必要时创建）SQLite 数据库文件。
    ///
    /// # Logic
    /// 1. 确保父目录存在。
    /// 2. 开启 `create_if_missing`，按角色决定是否强制外键。
    /// 3. 建立单连接的连接池。
    ///
    /// # Arguments
    /// * `path` - 数据库文件路径。
    /// * `role` - 源库或目标库。
    ///
    /// # Returns
    /// * `Result<Self, StoreError>` - 无法打开时返回 `StoreError::Connection`。
    pub async fn open(path: impl AsRef<Path>, role: SqliteRole) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Connection(e.to_string()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(role == SqliteRole::Target);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(connection_err)?;

        Ok(Self { pool, role })
    }

    /// 幂等地建立表与索引。
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let extra = match self.role {
            SqliteRole::Source => &[][..],
            SqliteRole::Target => schema::SQLITE_TARGET_INDEXES,
        };
        for statement in schema::SQLITE_TABLES.iter().chain(extra) {
            self.pool.execute(*statement).await.map_err(init_err)?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 关闭连接池。
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    /// # Summary
    /// 在一个事务内整体替换一个 symbol 的主记录与价格序列。
    ///
    /// # Logic
    /// 1. `INSERT OR REPLACE` 主记录。
    /// 2. 删除该 symbol 的旧采样。
    /// 3. 按参数上限分块写入新采样。
    /// 4. 提交；任一步失败时事务随 `tx` 释放而回滚。
    async fn replace_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let stock = &snapshot.stock;
        let mut tx = self.pool.begin().await.map_err(write_err)?;

        let upsert = schema::stocks_replace();
        let mut query = QueryBuilder::<Sqlite>::new(DIALECT.head(&upsert));
        query.push_values(std::iter::once(stock), |mut b, s| {
            b.push_bind(s.symbol.as_str())
                .push_bind(s.company_name.as_str())
                .push_bind(s.exchange.as_str())
                .push_bind(s.market_cap)
                .push_bind(s.beta)
                .push_bind(s.eps)
                .push_bind(s.roe)
                .push_bind(s.roa)
                .push_bind(s.match_price)
                .push_bind(s.changed_value)
                .push_bind(s.changed_ratio)
                .push_bind(s.total_volume)
                .push_bind(s.updated_at.as_str())
                .push_bind(s.full_data_json.as_str());
        });
        query.push(DIALECT.tail(&upsert));
        query.build().execute(&mut *tx).await.map_err(write_err)?;

        sqlx::query("DELETE FROM price_data WHERE symbol = ?")
            .bind(stock.symbol.as_str())
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;

        let insert = schema::prices_replace();
        for chunk in snapshot.samples.chunks(DIALECT.rows_per_statement(&insert)) {
            let mut query = QueryBuilder::<Sqlite>::new(DIALECT.head(&insert));
            query.push_values(chunk, |mut b, p| {
                b.push_bind(p.symbol.as_str())
                    .push_bind(p.timestamp)
                    .push_bind(p.open)
                    .push_bind(p.high)
                    .push_bind(p.low)
                    .push_bind(p.close)
                    .push_bind(p.volume);
            });
            query.push(DIALECT.tail(&insert));
            query.build().execute(&mut *tx).await.map_err(write_err)?;
        }

        tx.commit().await.map_err(write_err)?;
        debug!(
            "Replaced {} with {} price samples",
            stock.symbol,
            snapshot.samples.len()
        );
        Ok(())
    }
}

fn stock_record(row: &SqliteRow) -> Result<StockRecord, sqlx::Error> {
    Ok(StockRecord {
        symbol: row.try_get("symbol")?,
        company_name: row.try_get("company_name")?,
        exchange: row.try_get("exchange")?,
        market_cap: row.try_get("market_cap")?,
        beta: row.try_get("beta")?,
        eps: row.try_get("eps")?,
        roe: row.try_get("roe")?,
        roa: row.try_get("roa")?,
        match_price: row.try_get("match_price")?,
        changed_value: row.try_get("changed_value")?,
        changed_ratio: row.try_get("changed_ratio")?,
        total_volume: row.try_get("total_volume")?,
        updated_at: row.try_get("updated_at")?,
        full_data_json: row.try_get("full_data_json")?,
    })
}

fn price_record(row: &SqliteRow) -> Result<PriceRecord, sqlx::Error> {
    Ok(PriceRecord {
        symbol: row.try_get("symbol")?,
        timestamp: row.try_get("timestamp")?,
        open: row.try_get("open_price")?,
        high: row.try_get("high_price")?,
        low: row.try_get("low_price")?,
        close: row.try_get("close_price")?,
        volume: row.try_get("volume")?,
    })
}

async fn count(pool: &SqlitePool, table: Table) -> Result<u64, StoreError> {
    let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table.name()))
        .fetch_one(pool)
        .await
        .map_err(read_err)?;
    row_count(n)
}

#[async_trait]
impl MigrationSource for SqliteStore {
    async fn load_stocks(&self) -> Result<Vec<StockRecord>, StoreError> {
        let rows = sqlx::query(SELECT_STOCKS)
            .fetch_all(&self.pool)
            .await
            .map_err(read_err)?;
        rows.iter()
            .map(stock_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)
    }

    /// # Summary
    /// 基于键集的分页读取。
    ///
    /// # Logic
    /// 以行值比较 `(symbol, timestamp) > (?, ?)` 定位上一页之后的行，
    /// 由 `idx_price_symbol_timestamp` 直接定位与排序，每页代价只与页大小相关。
    /// 每页独立查询，不持有跨页的读事务。
    async fn price_page(
        &self,
        after: Option<&PriceKey>,
        limit: usize,
    ) -> Result<Vec<PriceRecord>, StoreError> {
        let limit = i64::try_from(limit).map_err(|e| StoreError::Read(e.to_string()))?;
        let rows = match after {
            None => {
                sqlx::query(&first_price_page())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            Some(key) => {
                sqlx::query(&next_price_page())
                    .bind(key.symbol.as_str())
                    .bind(key.timestamp)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(read_err)?;

        rows.iter()
            .map(price_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)
    }

    async fn count_rows(&self, table: Table) -> Result<u64, StoreError> {
        count(&self.pool, table).await
    }
}

#[async_trait]
impl MigrationTarget for SqliteStore {
    /// # Summary
    /// `ON CONFLICT (symbol) DO UPDATE` 写入一批主记录。
    ///
    /// # Logic
    /// 不使用 `INSERT OR REPLACE`：外键开启时整行删除会级联清掉子表。
    /// 定点小数以文本绑定，由列亲和性转换。
    async fn upsert_stocks(&self, batch: &[StockRow]) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(write_err)?;

        let upsert = schema::stocks_upsert();
        for chunk in batch.chunks(DIALECT.rows_per_statement(&upsert)) {
            let mut query = QueryBuilder::<Sqlite>::new(DIALECT.head(&upsert));
            query.push_values(chunk, |mut b, r| {
                b.push_bind(r.symbol.as_str())
                    .push_bind(r.company_name.as_deref())
                    .push_bind(r.exchange.as_deref())
                    .push_bind(r.market_cap.map(|d| d.to_string()))
                    .push_bind(r.beta.map(|d| d.to_string()))
                    .push_bind(r.eps.map(|d| d.to_string()))
                    .push_bind(r.roe.map(|d| d.to_string()))
                    .push_bind(r.roa.map(|d| d.to_string()))
                    .push_bind(r.match_price.map(|d| d.to_string()))
                    .push_bind(r.changed_value.map(|d| d.to_string()))
                    .push_bind(r.changed_ratio.map(|d| d.to_string()))
                    .push_bind(r.total_volume)
                    .push_bind(r.updated_at.as_deref())
                    .push_bind(r.full_data_json.as_deref());
            });
            query.push(DIALECT.tail(&upsert));
            query.build().execute(&mut *tx).await.map_err(write_err)?;
        }

        tx.commit().await.map_err(write_err)?;
        Ok(())
    }

    async fn clear_prices(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(write_err)?;
        sqlx::query("DELETE FROM price_data")
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        tx.commit().await.map_err(write_err)?;
        Ok(())
    }

    async fn insert_prices(&self, batch: &[PriceRow]) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(write_err)?;

        let insert = schema::prices_insert();
        for chunk in batch.chunks(DIALECT.rows_per_statement(&insert)) {
            let mut query = QueryBuilder::<Sqlite>::new(DIALECT.head(&insert));
            query.push_values(chunk, |mut b, p| {
                b.push_bind(p.symbol.as_str())
                    .push_bind(p.timestamp)
                    .push_bind(p.open.map(|d| d.to_string()))
                    .push_bind(p.high.map(|d| d.to_string()))
                    .push_bind(p.low.map(|d| d.to_string()))
                    .push_bind(p.close.map(|d| d.to_string()))
                    .push_bind(p.volume);
            });
            query.push(DIALECT.tail(&insert));
            query.build().execute(&mut *tx).await.map_err(write_err)?;
        }

        tx.commit().await.map_err(write_err)?;
        Ok(())
    }

    async fn count_rows(&self, table: Table) -> Result<u64, StoreError> {
        count(&self.pool, table).await
    }
}
