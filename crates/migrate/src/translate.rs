//! 源库行 → 目标库行的类型转换。
//!
//! 源库的浮点列以文本读出，这里直接把文本解析为定点小数，
//! 不经过 `f64`，因此不会引入额外的舍入。

use rust_decimal::Decimal;
use std::str::FromStr;
use stockdb_core::migrate::entity::{PriceRecord, PriceRow, StockRecord, StockRow, Table};
use stockdb_core::migrate::error::MigrateError;

/// # Summary
/// 把数值文本解析为 `Decimal`。
///
/// # Logic
/// 1. `None` 与空白文本视为空值。
/// 2. 先按普通小数解析，失败再按科学计数法解析（SQLite 对大数输出如 `1.5e+20`）。
///
/// # Returns
/// * 无法解析时返回 `None` 以外的错误，由调用方包装为 `MigrateError::Translate`。
pub fn parse_decimal(text: Option<&str>) -> Result<Option<Decimal>, rust_decimal::Error> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map(Some)
}

fn measure(
    table: Table,
    key: &str,
    column: &'static str,
    text: &Option<String>,
) -> Result<Option<Decimal>, MigrateError> {
    parse_decimal(text.as_deref()).map_err(|_| MigrateError::Translate {
        table,
        key: key.to_string(),
        column,
        value: text.clone().unwrap_or_default(),
    })
}

/// 转换一行 `stocks`；文本与整数列原样传递。
pub fn stock_row(record: &StockRecord) -> Result<StockRow, MigrateError> {
    let key = record.symbol.as_str();
    let m = |column: &'static str, text: &Option<String>| {
        measure(Table::Stocks, key, column, text)
    };

    Ok(StockRow {
        symbol: record.symbol.clone(),
        company_name: record.company_name.clone(),
        exchange: record.exchange.clone(),
        market_cap: m("market_cap", &record.market_cap)?,
        beta: m("beta", &record.beta)?,
        eps: m("eps", &record.eps)?,
        roe: m("roe", &record.roe)?,
        roa: m("roa", &record.roa)?,
        match_price: m("match_price", &record.match_price)?,
        changed_value: m("changed_value", &record.changed_value)?,
        changed_ratio: m("changed_ratio", &record.changed_ratio)?,
        total_volume: record.total_volume,
        updated_at: record.updated_at.clone(),
        full_data_json: record.full_data_json.clone(),
    })
}

/// 转换一行 `price_data`。
pub fn price_row(record: &PriceRecord) -> Result<PriceRow, MigrateError> {
    let key = format!("{}@{}", record.symbol, record.timestamp);
    let m = |column: &'static str, text: &Option<String>| {
        measure(Table::PriceData, &key, column, text)
    };

    Ok(PriceRow {
        symbol: record.symbol.clone(),
        timestamp: record.timestamp,
        open: m("open_price", &record.open)?,
        high: m("high_price", &record.high)?,
        low: m("low_price", &record.low)?,
        close: m("close_price", &record.close)?,
        volume: record.volume,
    })
}
