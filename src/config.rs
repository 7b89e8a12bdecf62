//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，所有字段均有默认值

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 管理接口的 Bearer Token（为空则拒绝所有管理请求）
    #[serde(default)]
    pub api_key: String,
    /// 出站请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 出站连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 缓存存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 是否启用本地缓存
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// SQLite 文件路径
    #[serde(default = "default_db_path")]
    pub path: String,
}

/// 上游数据源地址
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 涨停快照接口
    #[serde(default = "default_snapshot_url")]
    pub snapshot_url: String,
    /// 批量日线涨跌幅接口
    #[serde(default = "default_batch_url")]
    pub batch_url: String,
    /// 批量接口的访问令牌
    #[serde(default)]
    pub batch_token: String,
    /// 单只股票日K线接口（兜底）
    #[serde(default = "default_daily_bar_url")]
    pub daily_bar_url: String,
}

/// 管道节奏参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 表现窗口的交易日数量
    #[serde(default = "default_window_days")]
    pub window_days: usize,
    /// 批量预加载覆盖的自然日数量
    #[serde(default = "default_recent_days")]
    pub recent_days: u32,
    #[serde(default = "default_snapshot_timeout")]
    pub snapshot_timeout_secs: u64,
    /// 批量接口单次请求的时间预算（秒）
    #[serde(default = "default_batch_timeout")]
    pub batch_timeout_secs: u64,
    #[serde(default = "default_bar_timeout")]
    pub bar_timeout_secs: u64,
    /// 兜底时每只股票拉取的K线根数
    #[serde(default = "default_bar_count")]
    pub bar_count: usize,
    /// 兜底并发批次大小
    #[serde(default = "default_wave_size")]
    pub wave_size: usize,
    /// 批次之间的停顿（毫秒）
    #[serde(default = "default_wave_pause")]
    pub wave_pause_ms: u64,
    /// 多日预加载时日期之间的停顿（毫秒）
    #[serde(default = "default_date_pause")]
    pub date_pause_ms: u64,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub providers: ProviderConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }
fn default_db_path() -> String { "data/limitup.db".to_string() }
fn default_snapshot_url() -> String { "https://apphis.longhuvip.com/w1/api/index.php".to_string() }
fn default_batch_url() -> String { "http://api.tushare.pro".to_string() }
fn default_daily_bar_url() -> String {
    "https://quotes.sina.cn/cn/api/jsonp_v2.php/=/CN_MarketDataService.getKLineData".to_string()
}
fn default_window_days() -> usize { 5 }
fn default_recent_days() -> u32 { 6 }
fn default_snapshot_timeout() -> u64 { 15 }
fn default_batch_timeout() -> u64 { 20 }
fn default_bar_timeout() -> u64 { 10 }
fn default_bar_count() -> usize { 30 }
fn default_wave_size() -> usize { 10 }
fn default_wave_pause() -> u64 { 500 }
fn default_date_pause() -> u64 { 2000 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_db_path(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            snapshot_url: default_snapshot_url(),
            batch_url: default_batch_url(),
            batch_token: String::new(),
            daily_bar_url: default_daily_bar_url(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            recent_days: default_recent_days(),
            snapshot_timeout_secs: default_snapshot_timeout(),
            batch_timeout_secs: default_batch_timeout(),
            bar_timeout_secs: default_bar_timeout(),
            bar_count: default_bar_count(),
            wave_size: default_wave_size(),
            wave_pause_ms: default_wave_pause(),
            date_pause_ms: default_date_pause(),
        }
    }
}

impl PipelineConfig {
    pub fn wave_pause(&self) -> Duration {
        Duration::from_millis(self.wave_pause_ms)
    }

    pub fn date_pause(&self) -> Duration {
        Duration::from_millis(self.date_pause_ms)
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 环境变量 API_KEY / BATCH_TOKEN 会覆盖文件中的值
    pub fn load() -> Self {
        let config_paths = ["config.json", "config/config.json"];
        let mut config = None;

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(c) => {
                        log::info!("从 {} 加载配置成功", path);
                        config = Some(c);
                        break;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        let mut config = config.unwrap_or_else(|| {
            log::info!("使用默认配置");
            Self::default()
        });

        if let Ok(key) = std::env::var("API_KEY") {
            config.api.api_key = key;
        }
        if let Ok(token) = std::env::var("BATCH_TOKEN") {
            config.providers.batch_token = token;
        }
        config
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
