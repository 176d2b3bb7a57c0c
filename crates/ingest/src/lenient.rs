//! 宽松的字段读取：类型不符或缺失的值一律落到默认值，从不报错。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 数值：JSON 数字或可解析的数字字符串，其余为 `None`。
pub(crate) fn as_decimal(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// 整数：JSON 整数、小数部分为零的数字，或可解析的整数字符串。
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.0}").parse().ok()
    } else {
        None
    }
}

/// 文本：字符串原样保留，数字与布尔值转为文本，其余为空串。
pub(crate) fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_text(&value))
}

pub(crate) fn decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_decimal(&value))
}

pub(crate) fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_integer(&value))
}

/// 数组：非数组按空数组处理，元素保持原始值，留给调用方逐个解释。
pub(crate) fn array<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

/// 嵌套对象：不是对象时取 `T::default()`。
pub(crate) fn object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_object() {
        Ok(T::deserialize(value).unwrap_or_default())
    } else {
        Ok(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_accepts_numbers_and_numeric_strings() {
        assert_eq!(as_decimal(&json!(1.5)), Some(1.5));
        assert_eq!(as_decimal(&json!(7)), Some(7.0));
        assert_eq!(as_decimal(&json!(" 2.75 ")), Some(2.75));
        assert_eq!(as_decimal(&json!("N/A")), None);
        assert_eq!(as_decimal(&json!("NaN")), None);
        assert_eq!(as_decimal(&Value::Null), None);
        assert_eq!(as_decimal(&json!([1])), None);
    }

    #[test]
    fn test_integer_rejects_fractions() {
        assert_eq!(as_integer(&json!(1700000000)), Some(1_700_000_000));
        assert_eq!(as_integer(&json!(1500.0)), Some(1500));
        assert_eq!(as_integer(&json!("42")), Some(42));
        assert_eq!(as_integer(&json!(1.5)), None);
        assert_eq!(as_integer(&json!(u64::MAX)), None);
        assert_eq!(as_integer(&json!(true)), None);
    }

    #[test]
    fn test_text_defaults_to_empty() {
        assert_eq!(as_text(&json!("HOSE")), "HOSE");
        assert_eq!(as_text(&json!(12)), "12");
        assert_eq!(as_text(&Value::Null), "");
        assert_eq!(as_text(&json!({"a": 1})), "");
    }
}
