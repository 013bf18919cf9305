//! 核心模块 - 配置、时钟、后台任务与服务装配
//!
//! - [`Config`] - 服务配置
//! - [`Clock`] - 可注入时钟
//! - [`BackgroundTasks`] - 后台任务管理
//! - [`ServerState`] - 服务装配

pub mod clock;
pub mod config;
pub mod state;
pub mod tasks;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use state::{Repositories, ServerState};
pub use tasks::{BackgroundTasks, TaskKind};
