/// 服务器配置 - 订单服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | DATABASE_PATH | {WORK_DIR}/database/orders.db | SQLite 文件路径，`:memory:` 表示内存库 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_DIR | - | 日志目录，未设置时只输出到终端 |
/// | EVENT_QUEUE_CAPACITY | 100 | 通知队列容量 |
/// | MAX_PENDING_PUBLISHES | 256 | 等待入队的后台发布任务上限 |
/// | CONNECTION_BUFFER | 32 | 每个 WebSocket 连接的发送缓冲 |
/// | WS_PING_INTERVAL_SECS | 30 | WebSocket 心跳间隔 (秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时时间 (毫秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/orders HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// SQLite 数据库路径
    pub database_path: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
    /// 日志目录 (按天滚动)
    pub log_dir: Option<String>,

    // === 实时通知 ===
    /// 通知队列容量
    pub event_queue_capacity: usize,
    /// 后台发布任务上限，超过后立即返回过载错误
    pub max_pending_publishes: usize,
    /// 单个连接的发送缓冲
    pub connection_buffer: usize,
    /// WebSocket 心跳间隔 (秒)
    pub ws_ping_interval_secs: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

/// 内存数据库标识
pub const IN_MEMORY_DATABASE: &str = ":memory:";

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
        let database_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| format!("{}/database/orders.db", work_dir));

        Self {
            work_dir,
            database_path,
            http_port: env_parse("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            event_queue_capacity: env_parse("EVENT_QUEUE_CAPACITY", 100),
            max_pending_publishes: env_parse("MAX_PENDING_PUBLISHES", 256),
            connection_buffer: env_parse("CONNECTION_BUFFER", 32),
            ws_ping_interval_secs: env_parse("WS_PING_INTERVAL_SECS", 30),
            shutdown_timeout_ms: env_parse("SHUTDOWN_TIMEOUT_MS", 10000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(database_path: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.database_path = database_path.into();
        config.http_port = http_port;
        config
    }

    /// 测试配置: 内存数据库 + 随机端口
    pub fn for_tests() -> Self {
        Self::with_overrides(IN_MEMORY_DATABASE, 0)
    }

    /// 是否使用内存数据库
    pub fn is_in_memory(&self) -> bool {
        self.database_path == IN_MEMORY_DATABASE
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
