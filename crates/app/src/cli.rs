use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stockdb_core::config::AppConfig;

#[derive(Parser, Debug)]
#[command(version, about = "Stock snapshot ingestion and SQLite → MySQL migration", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to `stockdb.toml` in the working directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every `*.json` snapshot in a directory into the SQLite store.
    Ingest {
        /// Directory holding the snapshot documents.
        #[arg(long)]
        dir: Option<String>,

        /// SQLite database file.
        #[arg(long)]
        db: Option<String>,
    },

    /// Copy the SQLite store into a MySQL database.
    Migrate {
        /// SQLite database file to read from.
        #[arg(long)]
        db: Option<String>,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        #[arg(long)]
        user: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        database: Option<String>,

        #[arg(long)]
        stock_batch_size: Option<usize>,

        #[arg(long)]
        price_batch_size: Option<usize>,
    },
}

impl Commands {
    /// 命令行参数覆盖配置文件与环境变量中的同名项。
    pub fn apply(&self, config: &mut AppConfig) {
        match self {
            Commands::Ingest { dir, db } => {
                if let Some(dir) = dir {
                    config.source.documents_dir = dir.clone();
                }
                if let Some(db) = db {
                    config.source.sqlite_path = db.clone();
                }
            }
            Commands::Migrate {
                db,
                host,
                port,
                user,
                password,
                database,
                stock_batch_size,
                price_batch_size,
            } => {
                if let Some(db) = db {
                    config.source.sqlite_path = db.clone();
                }
                if let Some(host) = host {
                    config.target.host = host.clone();
                }
                if let Some(port) = port {
                    config.target.port = *port;
                }
                if let Some(user) = user {
                    config.target.user = user.clone();
                }
                if password.is_some() {
                    config.target.password = password.clone();
                }
                if let Some(database) = database {
                    config.target.database = database.clone();
                }
                if let Some(size) = stock_batch_size {
                    config.migration.stock_batch_size = *size;
                }
                if let Some(size) = price_batch_size {
                    config.migration.price_batch_size = *size;
                }
            }
        }
    }
}
