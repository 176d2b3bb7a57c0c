use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub target: TargetConfig,
    pub migration: MigrationConfig,
}

/// 入库来源与源库位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    // 存放 `*.json` 快照文档的目录
    pub documents_dir: String,
    // SQLite 源库文件路径
    pub sqlite_path: String,
}

/// MySQL 目标库连接参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    // 为空表示无密码登录
    pub password: Option<String>,
    pub database: String,
}

/// 迁移批次大小
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub stock_batch_size: usize,
    pub price_batch_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            documents_dir: "data/stocks".to_string(),
            sqlite_path: "data/stocks.db".to_string(),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
            database: "stocks_db".to_string(),
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            stock_batch_size: 100,
            price_batch_size: 1000,
        }
    }
}

impl TargetConfig {
    /// 用于日志输出的连接描述，不包含密码明文。
    pub fn display_dsn(&self) -> String {
        let password = if self.password.as_deref().is_some_and(|p| !p.is_empty()) {
            "***"
        } else {
            "no password"
        };
        format!(
            "{}@{}:{}/{} (password: {})",
            self.user, self.host, self.port, self.database, password
        )
    }
}
