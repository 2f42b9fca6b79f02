//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `lookup_runner` - 单个 RUC 查询器
//! - 为每次查询租一个新会话
//! - 把流程层的错误转换成失败记录
//!
//! ### `batch_processor` - 批量调度器
//! - 格式校验、并发控制（Semaphore）、单项超时
//! - 按完成顺序收集结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<RUC>)
//!     ↓
//! lookup_runner (处理单个 RUC，持有会话租约)
//!     ↓
//! workflow::LookupFlow (状态机)
//!     ↓
//! extraction / locator (只读提取)
//!     ↓
//! session (会话驱动：ChromeSession → JsExecutor)
//! ```

pub mod batch_processor;
pub mod lookup_runner;

pub use batch_processor::{run_batch, BatchOptions, MAX_CONCURRENCY};
pub use lookup_runner::LookupRunner;
