//! SQLite 存储客户端
//!
//! 由 main 显式创建并注入 CacheWriter。连接阶段如果被配置为禁用、
//! 或数据库无法打开，客户端进入禁用状态，之后的写入都是空操作。

use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::StorageConfig;
use crate::error::{PipelineError, PipelineResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS limit_up_snapshot (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    stock_code      TEXT NOT NULL,
    trade_date      TEXT NOT NULL,
    stock_name      TEXT NOT NULL,
    sector_label    TEXT NOT NULL,
    board_kind      TEXT NOT NULL,
    trade_amount    REAL NOT NULL,
    limit_up_time   TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    UNIQUE (stock_code, trade_date)
);

CREATE TABLE IF NOT EXISTS limit_up_performance (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    stock_code          TEXT NOT NULL,
    base_date           TEXT NOT NULL,
    performance_date    TEXT NOT NULL,
    pct_change          REAL NOT NULL,
    created_at          TEXT NOT NULL,
    UNIQUE (stock_code, base_date, performance_date)
);

CREATE INDEX IF NOT EXISTS idx_limit_up_snapshot_date ON limit_up_snapshot (trade_date);
CREATE INDEX IF NOT EXISTS idx_limit_up_performance_base ON limit_up_performance (base_date);
"#;

#[derive(Clone)]
pub struct StorageClient {
    conn: Option<Arc<Mutex<Connection>>>,
}

impl StorageClient {
    /// 按配置连接，失败时降级为禁用状态
    pub fn connect(config: &StorageConfig) -> Self {
        if !config.enabled {
            log::info!("缓存存储已禁用，跳过所有写入");
            return Self::disabled();
        }

        match Self::open(&config.path) {
            Ok(client) => {
                log::info!("📊 缓存数据库已打开: {}", config.path);
                client
            }
            Err(e) => {
                log::error!("❌ 打开缓存数据库 {} 失败，写入将被跳过: {}", config.path, e);
                Self::disabled()
            }
        }
    }

    /// 打开（必要时创建）数据库文件并初始化表结构
    pub fn open(path: &str) -> PipelineResult<Self> {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| PipelineError::Persistence(format!("创建目录 {:?} 失败: {}", parent, e)))?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> PipelineResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn disabled() -> Self {
        Self { conn: None }
    }

    fn from_connection(conn: Connection) -> PipelineResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Some(Arc::new(Mutex::new(conn))),
        })
    }

    pub fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    /// 在连接上执行操作；禁用状态返回 None
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> PipelineResult<T>,
    ) -> Option<PipelineResult<T>> {
        let conn = self.conn.as_ref()?;
        let result = match conn.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(_) => Err(PipelineError::Persistence("数据库连接锁已损坏".to_string())),
        };
        Some(result)
    }
}
