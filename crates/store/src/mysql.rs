use crate::dialect::Dialect;
use crate::error::{connection_err, init_err, read_err, row_count, write_err};
use crate::schema;
use async_trait::async_trait;
use sqlx::{
    Connection, Executor, MySql, MySqlConnection, MySqlPool, QueryBuilder,
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
};
use stockdb_core::config::TargetConfig;
use stockdb_core::migrate::entity::{PriceRow, StockRow, Table};
use stockdb_core::store::error::StoreError;
use stockdb_core::store::port::MigrationTarget;
use std::time::Duration;
use tracing::info;

const DIALECT: Dialect = Dialect::MySql;

/// 获取连接的超时时间
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// # Summary
/// MigrationTarget 的 MySQL 实现。
///
/// # Invariants
/// * 连接池只有一个连接，批次顺序写入。
/// * 每个写入方法都在自己的事务内完成并提交。
pub struct MySqlStore {
    pool: MySqlPool,
}

/// 库名会被拼进 DDL，只允许普通标识符字符。
fn validate_database_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid {
        Ok(())
    } else {
        Err(StoreError::Init(format!("invalid database name: {name:?}")))
    }
}

/// 不带库名的服务器连接参数。
fn server_options(config: &TargetConfig) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .charset("utf8mb4");
    match config.password.as_deref() {
        Some(password) if !password.is_empty() => options.password(password),
        _ => options,
    }
}

impl MySqlStore {
    /// 连接到目标库。
    ///
    /// # Logic
    /// 1. 校验库名。
    /// 2. 以单连接池连接到 `config.database`。
    ///
    /// # Arguments
    /// * `config` - 目标库连接参数。
    ///
    /// # Returns
    /// * `Result<Self, StoreError>` - 连接失败返回 `StoreError::Connection`。
    pub async fn connect(config: &TargetConfig) -> Result<Self, StoreError> {
        validate_database_name(&config.database)?;
        let options = server_options(config).database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(connection_err)?;

        Ok(Self { pool })
    }

    /// 在服务器上创建目标库（已存在则不做任何事）。
    pub async fn create_database(config: &TargetConfig) -> Result<(), StoreError> {
        validate_database_name(&config.database)?;
        let mut conn = MySqlConnection::connect_with(&server_options(config))
            .await
            .map_err(connection_err)?;

        let ddl = format!(
            "CREATE DATABASE IF NOT EXISTS `{}` CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci",
            config.database
        );
        conn.execute(ddl.as_str()).await.map_err(init_err)?;
        conn.close().await.map_err(connection_err)?;

        info!("Database {} ready", config.database);
        Ok(())
    }

    /// 幂等地建立表与索引。
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in schema::MYSQL_TABLES {
            self.pool.execute(*statement).await.map_err(init_err)?;
        }
        Ok(())
    }

    /// 关闭连接池。
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MigrationTarget for MySqlStore {
    /// # Summary
    /// `ON DUPLICATE KEY UPDATE` 写入一批主记录并提交。
    async fn upsert_stocks(&self, batch: &[StockRow]) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(write_err)?;

        let upsert = schema::stocks_upsert();
        for chunk in batch.chunks(DIALECT.rows_per_statement(&upsert)) {
            let mut query = QueryBuilder::<MySql>::new(DIALECT.head(&upsert));
            query.push_values(chunk, |mut b, r| {
                b.push_bind(r.symbol.as_str())
                    .push_bind(r.company_name.as_deref())
                    .push_bind(r.exchange.as_deref())
                    .push_bind(r.market_cap)
                    .push_bind(r.beta)
                    .push_bind(r.eps)
                    .push_bind(r.roe)
                    .push_bind(r.roa)
                    .push_bind(r.match_price)
                    .push_bind(r.changed_value)
                    .push_bind(r.changed_ratio)
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
            let mut query = QueryBuilder::<MySql>::new(DIALECT.head(&insert));
            query.push_values(chunk, |mut b, p| {
                b.push_bind(p.symbol.as_str())
                    .push_bind(p.timestamp)
                    .push_bind(p.open)
                    .push_bind(p.high)
                    .push_bind(p.low)
                    .push_bind(p.close)
                    .push_bind(p.volume);
            });
            query.build().execute(&mut *tx).await.map_err(write_err)?;
        }

        tx.commit().await.map_err(write_err)?;
        Ok(())
    }

    async fn count_rows(&self, table: Table) -> Result<u64, StoreError> {
        let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table.name()))
            .fetch_one(&self.pool)
            .await
            .map_err(read_err)?;
        row_count(n)
    }
}
