mod cli;
mod settings;

use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use stockdb_core::config::AppConfig;
use stockdb_ingest::driver::Ingestor;
use stockdb_ingest::source::DirectorySource;
use stockdb_migrate::migrator::Migrator;
use stockdb_store::mysql::MySqlStore;
use stockdb_store::sqlite::{SqliteRole, SqliteStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化具体存储实现并通过 `Arc<dyn Trait>` 注入入库驱动器或迁移器。
///
/// # Logic
/// 1. 初始化全局日志（`RUST_LOG`，默认 `info`）。
/// 2. 组装配置：默认值 → 配置文件 → 环境变量 → 命令行。
/// 3. 执行子命令；迁移失败或入库时连接丢失返回 Err，进程以非零状态退出。
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 2. 配置
    let cli = Cli::parse();
    let mut config = settings::load(cli.config.as_deref())?;
    cli.command.apply(&mut config);

    // 3. 子命令
    match cli.command {
        Commands::Ingest { .. } => ingest(&config).await,
        Commands::Migrate { .. } => migrate(&config).await,
    }
}

async fn ingest(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Ingesting {} into {}",
        config.source.documents_dir, config.source.sqlite_path
    );

    let documents = DirectorySource::open(&config.source.documents_dir)?;
    info!("Found {} JSON documents", documents.len());

    let store = Arc::new(SqliteStore::open(&config.source.sqlite_path, SqliteRole::Source).await?);
    store.init_schema().await?;

    let result = Ingestor::new(store.clone()).ingest(documents).await;
    store.close().await;
    let report = result?;

    println!("Total documents: {}", report.total);
    println!("Succeeded:       {}", report.succeeded);
    println!("Failed:          {}", report.failed);
    Ok(())
}

async fn migrate(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sqlite_path = &config.source.sqlite_path;
    if !Path::new(sqlite_path).is_file() {
        return Err(format!("SQLite source not found: {sqlite_path}").into());
    }
    info!(
        "Migrating {} into {}",
        sqlite_path,
        config.target.display_dsn()
    );

    let source = Arc::new(SqliteStore::open(sqlite_path, SqliteRole::Source).await?);

    MySqlStore::create_database(&config.target).await?;
    let target = Arc::new(MySqlStore::connect(&config.target).await?);
    target.init_schema().await?;

    let migrator = Migrator::new(source.clone(), target.clone(), config.migration.clone())?;
    let result = migrator.run().await;

    source.close().await;
    target.close().await;
    let report = result?;

    println!("{}", "=".repeat(50));
    println!("Migration result:");
    println!(
        "  Stocks:     {} -> {} records",
        report.counts.source_stocks, report.counts.target_stocks
    );
    println!(
        "  Price data: {} -> {} records",
        report.counts.source_prices, report.counts.target_prices
    );
    println!("  Batches:    {}", report.batches);
    println!("{}", "=".repeat(50));
    Ok(())
}
