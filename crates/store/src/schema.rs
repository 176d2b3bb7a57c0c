//! 两张表的列定义、建表语句与各场景下的写入语句描述。

use crate::dialect::{OnConflict, Upsert};

pub const STOCKS: &str = "stocks";
pub const PRICE_DATA: &str = "price_data";

/// `stocks` 的全部列，`symbol` 为主键。
pub const STOCK_COLUMNS: &[&str] = &[
    "symbol",
    "company_name",
    "exchange",
    "market_cap",
    "beta",
    "eps",
    "roe",
    "roa",
    "match_price",
    "changed_value",
    "changed_ratio",
    "total_volume",
    "updated_at",
    "full_data_json",
];

/// `price_data` 中需要写入的列（`id` 由库自增生成）。
pub const PRICE_COLUMNS: &[&str] = &[
    "symbol",
    "timestamp",
    "open_price",
    "high_price",
    "low_price",
    "close_price",
    "volume",
];

const STOCK_KEY: &[&str] = &["symbol"];
const PRICE_KEY: &[&str] = &["symbol", "timestamp"];

/// 入库：整行覆盖主记录。
pub fn stocks_replace() -> Upsert {
    Upsert::new(STOCKS, STOCK_COLUMNS, STOCK_KEY, OnConflict::Replace)
}

/// 迁移：主键冲突时覆盖全部非主键列。
pub fn stocks_upsert() -> Upsert {
    Upsert::update_all(STOCKS, STOCK_COLUMNS, STOCK_KEY)
}

/// 入库：同一文档内重复的时间戳以最后一条为准。
pub fn prices_replace() -> Upsert {
    Upsert::new(PRICE_DATA, PRICE_COLUMNS, PRICE_KEY, OnConflict::Replace)
}

/// 迁移：目标表已清空，普通插入。
pub fn prices_insert() -> Upsert {
    Upsert::new(PRICE_DATA, PRICE_COLUMNS, PRICE_KEY, OnConflict::Fail)
}

/// SQLite 建表语句。作为迁移目标时外键由连接参数开启。
pub const SQLITE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS stocks (
        symbol TEXT PRIMARY KEY,
        company_name TEXT,
        exchange TEXT,
        market_cap REAL,
        beta REAL,
        eps REAL,
        roe REAL,
        roa REAL,
        match_price REAL,
        changed_value REAL,
        changed_ratio REAL,
        total_volume INTEGER,
        updated_at TEXT,
        full_data_json TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS price_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        symbol TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        open_price REAL,
        high_price REAL,
        low_price REAL,
        close_price REAL,
        volume INTEGER,
        FOREIGN KEY (symbol) REFERENCES stocks(symbol) ON DELETE CASCADE,
        UNIQUE (symbol, timestamp)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_price_symbol ON price_data(symbol)",
    "CREATE INDEX IF NOT EXISTS idx_price_timestamp ON price_data(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_price_symbol_timestamp ON price_data(symbol, timestamp)",
];

/// 仅在迁移目标上建立的二级索引。
pub const SQLITE_TARGET_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_exchange ON stocks(exchange)",
    "CREATE INDEX IF NOT EXISTS idx_updated_at ON stocks(updated_at)",
];

/// MySQL 建表语句。定点小数列承接源库的浮点值，`updated_at` 原样保存文本。
pub const MYSQL_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS stocks (
        symbol VARCHAR(50) PRIMARY KEY,
        company_name TEXT,
        exchange VARCHAR(20),
        market_cap DECIMAL(20, 2),
        beta DECIMAL(10, 6),
        eps DECIMAL(10, 2),
        roe DECIMAL(10, 6),
        roa DECIMAL(10, 6),
        match_price DECIMAL(10, 2),
        changed_value DECIMAL(10, 2),
        changed_ratio DECIMAL(10, 2),
        total_volume BIGINT,
        updated_at VARCHAR(64),
        full_data_json LONGTEXT,
        INDEX idx_exchange (exchange),
        INDEX idx_updated_at (updated_at)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS price_data (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        symbol VARCHAR(50) NOT NULL,
        timestamp BIGINT NOT NULL,
        open_price DECIMAL(10, 2),
        high_price DECIMAL(10, 2),
        low_price DECIMAL(10, 2),
        close_price DECIMAL(10, 2),
        volume BIGINT,
        FOREIGN KEY (symbol) REFERENCES stocks(symbol) ON DELETE CASCADE,
        UNIQUE KEY unique_symbol_timestamp (symbol, timestamp),
        INDEX idx_symbol (symbol),
        INDEX idx_timestamp (timestamp),
        INDEX idx_symbol_timestamp (symbol, timestamp)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
    "#,
];
