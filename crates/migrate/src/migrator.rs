use crate::translate;
use std::sync::Arc;
use stockdb_core::config::MigrationConfig;
use stockdb_core::migrate::entity::{MigrationReport, PriceKey, RowCounts, Table};
use stockdb_core::migrate::error::MigrateError;
use stockdb_core::store::port::{MigrationSource, MigrationTarget};
use tracing::{error, info, warn};

fn as_count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// # Summary
/// 分批迁移器：把源库的 `stocks` 与 `price_data` 复制到目标库。
///
/// # Invariants
/// - 先完成全部 `stocks` 批次，再开始 `price_data`。
/// - 每个批次独立提交；任一批次失败立即终止，不再尝试后续批次或阶段。
/// - 行数核对只做报告，不影响结果。
pub struct Migrator {
    source: Arc<dyn MigrationSource>,
    target: Arc<dyn MigrationTarget>,
    config: MigrationConfig,
}

impl Migrator {
    /// # Summary
    /// 创建迁移器。
    ///
    /// # Returns
    /// * 批次大小为 0 时返回 `MigrateError::Config`。
    pub fn new(
        source: Arc<dyn MigrationSource>,
        target: Arc<dyn MigrationTarget>,
        config: MigrationConfig,
    ) -> Result<Self, MigrateError> {
        if config.stock_batch_size == 0 || config.price_batch_size == 0 {
            return Err(MigrateError::Config(format!(
                "batch sizes must be positive (stocks: {}, prices: {})",
                config.stock_batch_size, config.price_batch_size
            )));
        }
        Ok(Self {
            source,
            target,
            config,
        })
    }

    /// # Summary
    /// 执行一次完整迁移。
    ///
    /// # Logic
    /// 1. 阶段 A：按 symbol 顺序分批 upsert `stocks`。
    /// 2. 阶段 B：清空目标 `price_data`，再用有序游标分批普通插入。
    /// 3. 统计两端行数并报告差异。
    ///
    /// # Returns
    /// * 成功返回迁移汇总；任何错误都是致命的，原样返回。
    pub async fn run(&self) -> Result<MigrationReport, MigrateError> {
        let mut report = MigrationReport::default();

        let result = async {
            self.migrate_stocks(&mut report).await?;
            self.migrate_prices(&mut report).await?;
            report.counts = self.verify().await?;
            Ok::<_, MigrateError>(())
        }
        .await;

        if let Err(e) = result {
            error!(
                "Migration aborted after {} batches ({} stocks, {} prices committed): {}",
                report.batches, report.stocks_migrated, report.prices_migrated, e
            );
            if let MigrateError::Store(store) = &e {
                if store.is_connection() {
                    error!("Database connection lost; committed batches are kept, re-run to finish");
                }
            }
            return Err(e);
        }

        info!(
            "Migration finished: {} stocks, {} prices in {} batches",
            report.stocks_migrated, report.prices_migrated, report.batches
        );
        Ok(report)
    }

    async fn migrate_stocks(&self, report: &mut MigrationReport) -> Result<(), MigrateError> {
        let records = self.source.load_stocks().await?;
        let total = records.len();
        info!("Migrating {} stocks", total);

        for chunk in records.chunks(self.config.stock_batch_size) {
            let rows = chunk
                .iter()
                .map(translate::stock_row)
                .collect::<Result<Vec<_>, _>>()?;
            self.target.upsert_stocks(&rows).await?;

            report.stocks_migrated += as_count(rows.len());
            report.batches += 1;
            info!("  stocks: {}/{}", report.stocks_migrated, total);
        }
        Ok(())
    }

    async fn migrate_prices(&self, report: &mut MigrationReport) -> Result<(), MigrateError> {
        let total = self.source.count_rows(Table::PriceData).await?;
        info!("Migrating {} price samples", total);

        self.target.clear_prices().await?;

        let limit = self.config.price_batch_size;
        let mut after: Option<PriceKey> = None;
        loop {
            let page = self.source.price_page(after.as_ref(), limit).await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.key());

            let rows = page
                .iter()
                .map(translate::price_row)
                .collect::<Result<Vec<_>, _>>()?;
            self.target.insert_prices(&rows).await?;

            report.prices_migrated += as_count(rows.len());
            report.batches += 1;
            info!("  prices: {}/{}", report.prices_migrated, total);

            if page.len() < limit {
                break;
            }
        }
        Ok(())
    }

    /// # Summary
    /// 统计两端两张表的行数。
    ///
    /// # Logic
    /// 行数不一致时记录告警，但仍返回 Ok。
    pub async fn verify(&self) -> Result<RowCounts, MigrateError> {
        let counts = RowCounts {
            source_stocks: self.source.count_rows(Table::Stocks).await?,
            source_prices: self.source.count_rows(Table::PriceData).await?,
            target_stocks: self.target.count_rows(Table::Stocks).await?,
            target_prices: self.target.count_rows(Table::PriceData).await?,
        };

        info!(
            "Row counts: stocks {} -> {}, price_data {} -> {}",
            counts.source_stocks, counts.target_stocks, counts.source_prices, counts.target_prices
        );
        if !counts.is_consistent() {
            warn!("Row counts differ between source and target");
        }
        Ok(counts)
    }
}
