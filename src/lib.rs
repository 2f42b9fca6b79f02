//! # RUC Lookup
//!
//! 通过浏览器自动化批量查询秘鲁税务登记号（RUC）公开信息
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 为每个会话启动独立的 Chromium 进程
//! - `infrastructure/` - `JsExecutor`，唯一的 page owner，提供带超时的 eval() 能力
//!
//! ### ② 会话层（Session）
//! - `session/` - `Session` / `SessionFactory` trait，Chromium 实现和会话租约
//! - `locator/` - 按优先级尝试的定位策略
//!
//! ### ③ 提取层（Extraction）
//! - `extraction/` - 基本信息、表格、历史信息、纾困计划状态，只读不写
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 单个 RUC 的查询状态机和数据驱动的附加面板流程
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/` - 单个查询器和批量调度器（并发、超时、结果收集）
//!
//! ## 模块结构

pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod events;
pub mod extraction;
pub mod infrastructure;
pub mod locator;
pub mod models;
pub mod orchestrator;
pub mod session;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{BatchError, ConfigError, LookupError, SessionError, ValidationError};
pub use events::{EventSink, LookupEvent, NullSink, TracingSink};
pub use infrastructure::JsExecutor;
pub use models::{
    BatchResult, LookupFailure, LookupOutcome, LookupRecord, PanelFlags, PanelKind, Ruc,
};
pub use orchestrator::{BatchOptions, LookupRunner};
pub use session::{ChromeSessionFactory, Session, SessionFactory, SessionLease};
pub use workflow::{LookupCtx, LookupFlow, LookupState, PanelSpec, Transition};
