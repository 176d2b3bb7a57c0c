//! 插入/冲突处理语句的方言渲染。
//!
//! 同一个抽象的 upsert(行, 冲突键, 更新列) 在不同存储上有不同写法：
//! SQLite 用 `INSERT OR REPLACE` / `ON CONFLICT ... DO UPDATE`，
//! MySQL 用 `REPLACE INTO` / `ON DUPLICATE KEY UPDATE`。
//! 语句的 VALUES 部分由 `sqlx::QueryBuilder::push_values` 填充，
//! 这里只负责头部与尾部。

/// 冲突时的处理方式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnConflict {
    /// 普通插入，冲突即报错
    Fail,
    /// 整行覆盖
    Replace,
    /// 只覆盖列出的列
    Update(Vec<&'static str>),
}

/// # Summary
/// 与存储无关的 upsert 描述。
///
/// # Invariants
/// - `conflict_keys` 是 `columns` 的子集，并对应表上的主键或唯一约束。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert {
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub conflict_keys: &'static [&'static str],
    pub on_conflict: OnConflict,
}

impl Upsert {
    pub fn new(
        table: &'static str,
        columns: &'static [&'static str],
        conflict_keys: &'static [&'static str],
        on_conflict: OnConflict,
    ) -> Self {
        Self {
            table,
            columns,
            conflict_keys,
            on_conflict,
        }
    }

    /// 冲突时覆盖全部非键列。
    pub fn update_all(
        table: &'static str,
        columns: &'static [&'static str],
        conflict_keys: &'static [&'static str],
    ) -> Self {
        let update = columns
            .iter()
            .copied()
            .filter(|c| !conflict_keys.contains(c))
            .collect();
        Self::new(table, columns, conflict_keys, OnConflict::Update(update))
    }
}

/// 支持的 SQL 方言。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
}

impl Dialect {
    /// # Summary
    /// 渲染语句头部，形如 `INSERT INTO t (a, b) `，后接 `VALUES ...`。
    pub fn head(&self, upsert: &Upsert) -> String {
        let verb = match (self, &upsert.on_conflict) {
            (Dialect::Sqlite, OnConflict::Replace) => "INSERT OR REPLACE INTO",
            (Dialect::MySql, OnConflict::Replace) => "REPLACE INTO",
            _ => "INSERT INTO",
        };
        format!("{} {} ({}) ", verb, upsert.table, upsert.columns.join(", "))
    }

    /// # Summary
    /// 渲染 VALUES 之后的冲突子句，`Fail` 与 `Replace` 没有尾部。
    ///
    /// # Logic
    /// 1. SQLite：`ON CONFLICT (键) DO UPDATE SET c = excluded.c`，无更新列时 `DO NOTHING`。
    /// 2. MySQL：`ON DUPLICATE KEY UPDATE c = VALUES(c)`，无更新列时把首个键赋给自身。
    pub fn tail(&self, upsert: &Upsert) -> String {
        let OnConflict::Update(columns) = &upsert.on_conflict else {
            return String::new();
        };
        match self {
            Dialect::Sqlite => {
                let keys = upsert.conflict_keys.join(", ");
                if columns.is_empty() {
                    return format!(" ON CONFLICT ({}) DO NOTHING", keys);
                }
                let sets = columns
                    .iter()
                    .map(|c| format!("{c} = excluded.{c}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(" ON CONFLICT ({}) DO UPDATE SET {}", keys, sets)
            }
            Dialect::MySql => {
                let sets = if columns.is_empty() {
                    upsert
                        .conflict_keys
                        .first()
                        .map(|k| format!("{k} = {k}"))
                        .unwrap_or_default()
                } else {
                    columns
                        .iter()
                        .map(|c| format!("{c} = VALUES({c})"))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                format!(" ON DUPLICATE KEY UPDATE {}", sets)
            }
        }
    }

    /// 单条语句允许的绑定参数上限。
    pub fn max_bind_params(&self) -> usize {
        match self {
            Dialect::Sqlite => 32_766,
            Dialect::MySql => 65_535,
        }
    }

    /// 在参数上限内，一条多行 VALUES 语句最多容纳的行数（至少 1）。
    pub fn rows_per_statement(&self, upsert: &Upsert) -> usize {
        (self.max_bind_params() / upsert.columns.len().max(1)).max(1)
    }
}
