//! JSON 快照文档的归一化与批量入库。

pub mod driver;
pub mod normalize;
pub mod source;

mod lenient;
