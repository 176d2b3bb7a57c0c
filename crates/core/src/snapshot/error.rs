use thiserror::Error;

/// # Summary
/// 文档归一化错误，即"输入格式错误"一类。
///
/// # Invariants
/// - 只在文档整体无法解析，或缺少可用的 `symbol` 时产生；
///   字段缺失一律按默认值处理，不会产生此错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    // 文档不是合法的 JSON 对象
    #[error("Malformed document: {0}")]
    Malformed(String),
    // symbol 缺失或为空串
    #[error("Document has no symbol")]
    MissingSymbol,
}
