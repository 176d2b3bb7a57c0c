//! `stockdb-core` 中各存储端口的 sqlx 实现。

pub mod dialect;
pub mod mysql;
pub mod schema;
pub mod sqlite;

mod error;
