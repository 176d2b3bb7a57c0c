use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// # Summary
/// 迁移涉及的两张表。
///
/// # Invariants
/// - `PriceData` 依赖 `Stocks`，迁移顺序必须先 `Stocks` 后 `PriceData`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    Stocks,
    PriceData,
}

impl Table {
    /// 表在两端存储中的物理名称。
    pub fn name(&self) -> &'static str {
        match self {
            Table::Stocks => "stocks",
            Table::PriceData => "price_data",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// # Summary
/// 从源库读出的 `stocks` 行。
///
/// # Invariants
/// - 数值度量保持源库的文本形式 (`CAST(col AS TEXT)`)，
///   由迁移器负责无损转换为定点小数，避免浮点往返。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRecord {
    pub symbol: String,
    pub company_name: Option<String>,
    pub exchange: Option<String>,
    pub market_cap: Option<String>,
    pub beta: Option<String>,
    pub eps: Option<String>,
    pub roe: Option<String>,
    pub roa: Option<String>,
    pub match_price: Option<String>,
    pub changed_value: Option<String>,
    pub changed_ratio: Option<String>,
    pub total_volume: Option<i64>,
    pub updated_at: Option<String>,
    pub full_data_json: Option<String>,
}

/// # Summary
/// 已转换为目标库类型的 `stocks` 行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRow {
    pub symbol: String,
    pub company_name: Option<String>,
    pub exchange: Option<String>,
    pub market_cap: Option<Decimal>,
    pub beta: Option<Decimal>,
    pub eps: Option<Decimal>,
    pub roe: Option<Decimal>,
    pub roa: Option<Decimal>,
    pub match_price: Option<Decimal>,
    pub changed_value: Option<Decimal>,
    pub changed_ratio: Option<Decimal>,
    pub total_volume: Option<i64>,
    pub updated_at: Option<String>,
    pub full_data_json: Option<String>,
}

/// # Summary
/// 从源库读出的 `price_data` 行，价格为文本形式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    pub symbol: String,
    pub timestamp: i64,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub close: Option<String>,
    pub volume: Option<i64>,
}

impl PriceRecord {
    /// 该行在 (`symbol`, `timestamp`) 排序中的位置。
    pub fn key(&self) -> PriceKey {
        PriceKey {
            symbol: self.symbol.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// # Summary
/// 已转换为目标库类型的 `price_data` 行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRow {
    pub symbol: String,
    pub timestamp: i64,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<i64>,
}

/// # Summary
/// `price_data` 上按 (`symbol`, `timestamp`) 排序的游标位置。
///
/// # Invariants
/// - 分页读取时只返回严格大于该位置的行，因此可从任意位置重启。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceKey {
    pub symbol: String,
    pub timestamp: i64,
}

/// # Summary
/// 迁移完成后两端的行数统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    pub source_stocks: u64,
    pub source_prices: u64,
    pub target_stocks: u64,
    pub target_prices: u64,
}

impl RowCounts {
    /// 两张表的行数在两端是否一致。
    pub fn is_consistent(&self) -> bool {
        self.source_stocks == self.target_stocks && self.source_prices == self.target_prices
    }
}

/// # Summary
/// 一次完整迁移的结果汇总。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    // 写入目标库的 stocks 行数
    pub stocks_migrated: u64,
    // 写入目标库的 price_data 行数
    pub prices_migrated: u64,
    // 提交的批次数
    pub batches: u64,
    pub counts: RowCounts,
}
