//! 进程级组件: 环境配置 ([`Config`])、共享状态 ([`ServerState`])、
//! 监听与优雅关闭 ([`Server`])，以及启动期错误 ([`ServerError`])

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
