//! Order Server - 餐厅订单与实时通知服务
//!
//! # 架构概述
//!
//! - **订单** (`orders`): 订单聚合存储、按桌台分组
//! - **数据库** (`db`): SQLite 连接池、迁移和仓储
//! - **实时通知** (`notify`): 有界事件总线、分发器、连接注册表
//! - **HTTP API** (`api`): REST 接口和 WebSocket 端点
//!
//! # 模块结构
//!
//! ```text
//! order-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── db/            # SQLite + 仓储
//! ├── orders/        # 订单存储
//! ├── notify/        # 事件总线 / 分发 / 连接
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use notify::{ConnectionRegistry, Dispatcher, EventBus};
pub use orders::OrderStore;
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// 加载 `.env`、读取配置并初始化日志
pub fn setup_environment() -> Config {
    let dotenv_result = dotenv::dotenv();
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    if let Err(e) = dotenv_result {
        tracing::debug!("No .env file loaded: {e}");
    }
    config
}
