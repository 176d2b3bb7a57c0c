//! 源库 → 目标库的分批迁移。

pub mod migrator;
pub mod translate;
