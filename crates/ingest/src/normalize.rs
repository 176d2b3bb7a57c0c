//! 单个快照文档 → `Snapshot`。
//!
//! 文档模型中每个字段都声明了来源路径（serde 字段名）和默认值
//! （`#[serde(default)]` 加 `lenient` 适配器），因此缺失或类型不符的字段
//! 从不导致失败。只有整个文档无法解析，或没有可用的 symbol 时才报错。

use crate::lenient;
use serde::Deserialize;
use serde_json::Value;
use stockdb_core::snapshot::entity::{PriceSample, Snapshot, StockSnapshot};
use stockdb_core::snapshot::error::NormalizeError;
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Document {
    #[serde(deserialize_with = "lenient::text")]
    symbol: String,
    #[serde(rename = "basicInfo", deserialize_with = "lenient::object")]
    basic_info: BasicInfo,
    #[serde(rename = "priceData", deserialize_with = "lenient::object")]
    price_data: PriceSeries,
    #[serde(rename = "fullData", default = "empty_object")]
    full_data: Value,
    #[serde(rename = "updatedAt", deserialize_with = "lenient::text")]
    updated_at: String,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BasicInfo {
    #[serde(deserialize_with = "lenient::text")]
    company_name: String,
    #[serde(deserialize_with = "lenient::text")]
    exchange: String,
    #[serde(deserialize_with = "lenient::decimal")]
    market_cap: Option<f64>,
    #[serde(deserialize_with = "lenient::decimal")]
    beta: Option<f64>,
    #[serde(deserialize_with = "lenient::decimal")]
    eps: Option<f64>,
    #[serde(deserialize_with = "lenient::decimal")]
    roe: Option<f64>,
    #[serde(deserialize_with = "lenient::decimal")]
    roa: Option<f64>,
    #[serde(deserialize_with = "lenient::decimal")]
    match_price: Option<f64>,
    #[serde(deserialize_with = "lenient::decimal")]
    changed_value: Option<f64>,
    #[serde(deserialize_with = "lenient::decimal")]
    changed_ratio: Option<f64>,
    #[serde(deserialize_with = "lenient::integer")]
    total_volume: Option<i64>,
}

/// 并行数组形式的价格序列，长度以 `t` 为准。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PriceSeries {
    #[serde(deserialize_with = "lenient::array")]
    t: Vec<Value>,
    #[serde(deserialize_with = "lenient::array")]
    o: Vec<Value>,
    #[serde(deserialize_with = "lenient::array")]
    h: Vec<Value>,
    #[serde(deserialize_with = "lenient::array")]
    l: Vec<Value>,
    #[serde(deserialize_with = "lenient::array")]
    c: Vec<Value>,
    #[serde(deserialize_with = "lenient::array")]
    v: Vec<Value>,
}

impl PriceSeries {
    /// # Summary
    /// 展开为逐条采样。
    ///
    /// # Logic
    /// 1. 遍历 `t` 的每个下标 `i`。
    /// 2. 其余数组缺少下标 `i` 或该元素不是数值时，对应字段为 `None`。
    /// 3. `t[i]` 不是整数时无法构成采样，跳过并告警。
    fn samples(&self, symbol: &str) -> Vec<PriceSample> {
        let decimal_at = |column: &[Value], i: usize| column.get(i).and_then(lenient::as_decimal);

        self.t
            .iter()
            .enumerate()
            .filter_map(|(i, t)| {
                let Some(timestamp) = lenient::as_integer(t) else {
                    warn!("[{symbol}] skipping price sample {i}: timestamp {t} is not an integer");
                    return None;
                };
                Some(PriceSample {
                    symbol: symbol.to_string(),
                    timestamp,
                    open: decimal_at(&self.o, i),
                    high: decimal_at(&self.h, i),
                    low: decimal_at(&self.l, i),
                    close: decimal_at(&self.c, i),
                    volume: self.v.get(i).and_then(lenient::as_integer),
                })
            })
            .collect()
    }
}

/// 把原始字节解析为 JSON 树。
///
/// # Returns
/// * 语法错误或顶层不是对象时返回 `NormalizeError::Malformed`。
pub fn parse_document(bytes: &[u8]) -> Result<Value, NormalizeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| NormalizeError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(NormalizeError::Malformed(
            "top-level value is not an object".to_string(),
        ));
    }
    Ok(value)
}

/// # Summary
/// 把一份已解析的文档归一化为主记录与价格采样。
///
/// # Logic
/// 1. 按文档模型读取全部字段，缺失的一律取默认值。
/// 2. symbol 为空时拒绝，避免无 symbol 的文档合并成同一行。
/// 3. `fullData` 序列化为文本（保留非 ASCII 字符与键顺序）。
/// 4. 按 `t` 的长度展开价格采样。
///
/// # Arguments
/// * `document` - 已解析的 JSON 树。
///
/// # Returns
/// * `Result<Snapshot, NormalizeError>`
pub fn normalize(document: &Value) -> Result<Snapshot, NormalizeError> {
    if !document.is_object() {
        return Err(NormalizeError::Malformed(
            "top-level value is not an object".to_string(),
        ));
    }
    let doc = Document::deserialize(document).map_err(|e| NormalizeError::Malformed(e.to_string()))?;
    if doc.symbol.trim().is_empty() {
        return Err(NormalizeError::MissingSymbol);
    }

    let full_data_json =
        serde_json::to_string(&doc.full_data).map_err(|e| NormalizeError::Malformed(e.to_string()))?;
    let samples = doc.price_data.samples(&doc.symbol);
    let info = doc.basic_info;

    Ok(Snapshot {
        stock: StockSnapshot {
            symbol: doc.symbol,
            company_name: info.company_name,
            exchange: info.exchange,
            market_cap: info.market_cap,
            beta: info.beta,
            eps: info.eps,
            roe: info.roe,
            roa: info.roa,
            match_price: info.match_price,
            changed_value: info.changed_value,
            changed_ratio: info.changed_ratio,
            total_volume: info.total_volume,
            updated_at: doc.updated_at,
            full_data_json,
        },
        samples,
    })
}

/// `parse_document` 与 `normalize` 的组合。
pub fn normalize_bytes(bytes: &[u8]) -> Result<Snapshot, NormalizeError> {
    normalize(&parse_document(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_document() {
        let doc = json!({
            "symbol": "VNM",
            "basicInfo": {
                "companyName": "Vinamilk",
                "exchange": "HOSE",
                "marketCap": 150000000000.0,
                "beta": 0.8,
                "eps": 4500,
                "roe": 0.25,
                "roa": 0.18,
                "matchPrice": 65.4,
                "changedValue": -0.3,
                "changedRatio": -0.46,
                "totalVolume": 1250000
            },
            "priceData": {
                "t": [1700000000, 1700086400],
                "o": [65.0, 65.5],
                "h": [66.0, 66.1],
                "l": [64.5, 65.0],
                "c": [65.5, 65.4],
                "v": [100, 200]
            },
            "fullData": {"note": "ok"},
            "updatedAt": "2024-11-15T08:00:00Z"
        });

        let snap = normalize(&doc).unwrap();
        assert_eq!(snap.symbol(), "VNM");
        assert_eq!(snap.stock.company_name, "Vinamilk");
        assert_eq!(snap.stock.eps, Some(4500.0));
        assert_eq!(snap.stock.changed_value, Some(-0.3));
        assert_eq!(snap.stock.total_volume, Some(1_250_000));
        assert_eq!(snap.stock.updated_at, "2024-11-15T08:00:00Z");
        assert_eq!(snap.stock.full_data_json, r#"{"note":"ok"}"#);
        assert_eq!(snap.samples.len(), 2);
        assert_eq!(snap.samples[1].timestamp, 1_700_086_400);
        assert_eq!(snap.samples[1].close, Some(65.4));
        assert_eq!(snap.samples[1].volume, Some(200));
        assert!(snap.samples.iter().all(|s| s.symbol == "VNM"));
    }

    #[test]
    fn test_ragged_arrays_default_to_null() {
        let doc = json!({
            "symbol": "FPT",
            "priceData": {"t": [1, 2, 3], "o": [10]}
        });

        let snap = normalize(&doc).unwrap();
        assert_eq!(snap.samples.len(), 3);
        assert_eq!(snap.samples[0].open, Some(10.0));
        assert_eq!(snap.samples[1].open, None);
        assert_eq!(snap.samples[2].open, None);
        assert!(snap.samples.iter().all(|s| s.high.is_none() && s.volume.is_none()));
    }

    #[test]
    fn test_longer_side_arrays_are_truncated_to_timestamps() {
        let doc = json!({
            "symbol": "FPT",
            "priceData": {"t": [1], "c": [1.0, 2.0, 3.0], "v": [5, 6]}
        });
        let snap = normalize(&doc).unwrap();
        assert_eq!(snap.samples.len(), 1);
        assert_eq!(snap.samples[0].close, Some(1.0));
        assert_eq!(snap.samples[0].volume, Some(5));
    }

    #[test]
    fn test_missing_or_empty_series() {
        let absent = normalize(&json!({"symbol": "HPG"})).unwrap();
        assert!(absent.samples.is_empty());

        let empty = normalize(&json!({"symbol": "HPG", "priceData": {"t": [], "o": [1]}})).unwrap();
        assert!(empty.samples.is_empty());

        let not_an_object = normalize(&json!({"symbol": "HPG", "priceData": [1, 2]})).unwrap();
        assert!(not_an_object.samples.is_empty());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let snap = normalize(&json!({"symbol": "MWG"})).unwrap();
        let stock = &snap.stock;
        assert_eq!(stock.company_name, "");
        assert_eq!(stock.exchange, "");
        assert_eq!(stock.market_cap, None);
        assert_eq!(stock.total_volume, None);
        assert_eq!(stock.updated_at, "");
        assert_eq!(stock.full_data_json, "{}");
    }

    #[test]
    fn test_wrong_typed_fields_take_defaults() {
        let doc = json!({
            "symbol": "SSI",
            "basicInfo": {
                "companyName": null,
                "exchange": 7,
                "marketCap": "1200.5",
                "beta": "n/a",
                "totalVolume": 12.5
            },
            "priceData": {"t": [1, null, "3"], "o": [null, 2, "x"]},
            "updatedAt": {"unexpected": true}
        });

        let snap = normalize(&doc).unwrap();
        assert_eq!(snap.stock.company_name, "");
        assert_eq!(snap.stock.exchange, "7");
        assert_eq!(snap.stock.market_cap, Some(1200.5));
        assert_eq!(snap.stock.beta, None);
        assert_eq!(snap.stock.total_volume, None);
        assert_eq!(snap.stock.updated_at, "");

        let stamps: Vec<i64> = snap.samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![1, 3]);
        assert_eq!(snap.samples[0].open, None);
        assert_eq!(snap.samples[1].open, None);
    }

    #[test]
    fn test_basic_info_not_an_object() {
        let snap = normalize(&json!({"symbol": "ACB", "basicInfo": "broken"})).unwrap();
        assert_eq!(snap.stock.company_name, "");
        assert_eq!(snap.stock.eps, None);
    }

    #[test]
    fn test_empty_symbol_is_rejected() {
        assert_eq!(normalize(&json!({})), Err(NormalizeError::MissingSymbol));
        assert_eq!(
            normalize(&json!({"symbol": "  ", "priceData": {"t": [1]}})),
            Err(NormalizeError::MissingSymbol)
        );
    }

    #[test]
    fn test_unparseable_documents() {
        assert!(matches!(
            normalize_bytes(b"{\"symbol\": \"VNM\""),
            Err(NormalizeError::Malformed(_))
        ));
        assert!(matches!(normalize_bytes(b"[1, 2]"), Err(NormalizeError::Malformed(_))));
        assert!(matches!(normalize_bytes(b""), Err(NormalizeError::Malformed(_))));
    }

    #[test]
    fn test_full_data_round_trip_keeps_unicode_and_order() {
        let raw = r#"{"symbol":"VIC","fullData":{"zeta":1,"tên":"Tập đoàn Vingroup","alpha":[1.5,{"k":null}]}}"#;
        let snap = normalize_bytes(raw.as_bytes()).unwrap();
        assert_eq!(
            snap.stock.full_data_json,
            r#"{"zeta":1,"tên":"Tập đoàn Vingroup","alpha":[1.5,{"k":null}]}"#
        );

        let reparsed: Value = serde_json::from_str(&snap.stock.full_data_json).unwrap();
        let original: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(reparsed, original["fullData"]);
        assert_eq!(serde_json::to_string(&reparsed).unwrap(), snap.stock.full_data_json);
    }

    #[test]
    fn test_explicit_null_full_data() {
        let snap = normalize(&json!({"symbol": "VIC", "fullData": null})).unwrap();
        assert_eq!(snap.stock.full_data_json, "null");
    }
}
