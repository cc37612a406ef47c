//! SQLite 存储: 连接池和迁移

pub mod repository;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use shared::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

/// 文件库的写锁等待时间
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// 打开 (必要时创建) 数据库文件并执行迁移
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        if let Some(dir) = Path::new(db_path).parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| AppError::database(format!("Cannot create {}: {e}", dir.display())))?;
        }

        let options = parse_url(&format!("sqlite:{db_path}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let db = Self::connect(SqlitePoolOptions::new().max_connections(5), options).await?;
        tracing::info!(path = %db_path, "SQLite database opened");
        Ok(db)
    }

    /// 私有内存库
    ///
    /// 每个内存连接都是独立的数据库，所以池固定为一个永不回收的连接。
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::connect(pool, parse_url("sqlite::memory:")?).await
    }

    async fn connect(
        pool: SqlitePoolOptions,
        options: SqliteConnectOptions,
    ) -> Result<Self, AppError> {
        let pool = pool
            .connect_with(options.foreign_keys(true))
            .await
            .map_err(|e| AppError::database(format!("Cannot connect to SQLite: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        tracing::debug!("Schema up to date");

        Ok(Self { pool })
    }
}

fn parse_url(url: &str) -> Result<SqliteConnectOptions, AppError> {
    SqliteConnectOptions::from_str(url)
        .map_err(|e| AppError::database(format!("Bad database location {url}: {e}")))
}
