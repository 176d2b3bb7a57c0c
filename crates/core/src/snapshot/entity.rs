use serde::{Deserialize, Serialize};

/// # Summary
/// 单个证券的主记录，对应 `stocks` 表的一行。
///
/// # Invariants
/// - `symbol` 非空，是跨多次入库保持稳定的主键。
/// - 文本字段缺省为空串，数值字段缺省为 `None`。
/// - `full_data_json` 是 `fullData` 子树的序列化文本，原样保存。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    // 证券代码
    pub symbol: String,
    // 公司名称
    pub company_name: String,
    // 所属交易所
    pub exchange: String,
    // 市值
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
    // 每股收益
    pub eps: Option<f64>,
    // 净资产收益率
    pub roe: Option<f64>,
    // 总资产收益率
    pub roa: Option<f64>,
    // 最新成交价
    pub match_price: Option<f64>,
    // 涨跌额
    pub changed_value: Option<f64>,
    // 涨跌幅
    pub changed_ratio: Option<f64>,
    // 总成交量
    pub total_volume: Option<i64>,
    // 上游给出的更新时间，本系统不做解析
    pub updated_at: String,
    // fullData 的 JSON 文本
    pub full_data_json: String,
}

/// # Summary
/// 单条价格采样，对应 `price_data` 表的一行。
///
/// # Invariants
/// - (`symbol`, `timestamp`) 在同一时刻至多存在一条。
/// - `symbol` 引用 `stocks.symbol`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub symbol: String,
    pub timestamp: i64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

/// # Summary
/// 一份文档归一化后的完整结果：主记录加其全部价格采样。
///
/// # Invariants
/// - `samples` 中每一项的 `symbol` 都等于 `stock.symbol`。
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub stock: StockSnapshot,
    pub samples: Vec<PriceSample>,
}

impl Snapshot {
    pub fn symbol(&self) -> &str {
        &self.stock.symbol
    }
}
