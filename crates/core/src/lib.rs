//! 股票快照入库与跨库迁移的核心领域定义。
//!
//! 本 crate 只包含实体、错误与端口 (port) trait，不依赖任何具体存储实现。

pub mod config;
pub mod ingest;
pub mod migrate;
pub mod snapshot;
pub mod store;
