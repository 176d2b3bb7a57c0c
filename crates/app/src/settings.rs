use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use stockdb_core::config::AppConfig;

/// 未指定 `--config` 时尝试读取的配置文件（可缺省）
const DEFAULT_FILE: &str = "stockdb";

/// # Summary
/// 组装应用配置。
///
/// # Logic
/// 按优先级从低到高叠加：
/// 1. `AppConfig::default()`。
/// 2. 配置文件：显式给出的路径必须存在，否则只在存在时读取 `stockdb.toml`。
/// 3. `STOCKDB__` 前缀的环境变量，层级用 `__` 分隔，例如 `STOCKDB__TARGET__HOST`。
///
/// 命令行参数的覆盖由调用方在此之后完成。
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_FILE).required(false),
    };

    Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(file)
        .add_source(Environment::with_prefix("STOCKDB").separator("__"))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stockdb.toml");
        std::fs::write(
            &path,
            "[target]\nhost = \"10.0.0.5\"\ndatabase = \"market\"\n\n[migration]\nprice_batch_size = 250\n",
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.target.host, "10.0.0.5");
        assert_eq!(config.target.database, "market");
        assert_eq!(config.target.port, 3306);
        assert_eq!(config.migration.price_batch_size, 250);
        assert_eq!(config.migration.stock_batch_size, 100);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(load(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }
}
