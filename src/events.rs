//! 查询事件
//!
//! 状态机和调度器通过注入的 `EventSink` 发出结构化事件，
//! 默认由 `TracingSink` 转成日志，测试里可以换成 `NullSink` 或自定义的收集器。

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::{FailureReason, PanelKind};
use crate::workflow::LookupState;

/// 生命周期事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LookupEvent {
    BatchStarted {
        total: usize,
        concurrency: usize,
    },
    LookupStarted {
        ruc: String,
    },
    StateChanged {
        ruc: String,
        state: LookupState,
    },
    PanelSkipped {
        ruc: String,
        panel: PanelKind,
        reason: String,
    },
    PanelFinished {
        ruc: String,
        panel: PanelKind,
        found: bool,
    },
    LookupFinished {
        ruc: String,
        success: bool,
        reason: Option<FailureReason>,
        elapsed_ms: u64,
    },
    BatchFinished {
        total: usize,
        succeeded: usize,
        failed: usize,
        elapsed_ms: u64,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LookupEvent);
}

/// 把事件写入 tracing 日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LookupEvent) {
        match event {
            LookupEvent::BatchStarted { total, concurrency } => {
                info!("🚀 开始批量查询: {} 个 RUC, 并发数 {}", total, concurrency);
            }
            LookupEvent::LookupStarted { ruc } => {
                info!("[RUC {}] 🔍 开始查询", ruc);
            }
            LookupEvent::StateChanged { ruc, state } => {
                debug!("[RUC {}] 状态 → {}", ruc, state);
            }
            LookupEvent::PanelSkipped { ruc, panel, reason } => {
                warn!("[RUC {}] ⏭️ 跳过面板 {}: {}", ruc, panel, reason);
            }
            LookupEvent::PanelFinished { ruc, panel, found } => {
                if *found {
                    info!("[RUC {}] ✓ 面板 {} 提取完成", ruc, panel);
                } else {
                    info!("[RUC {}] ℹ 面板 {} 无数据", ruc, panel);
                }
            }
            LookupEvent::LookupFinished {
                ruc,
                success,
                reason,
                elapsed_ms,
            } => {
                if *success {
                    info!("[RUC {}] ✅ 查询成功 ({} ms)", ruc, elapsed_ms);
                } else {
                    warn!(
                        "[RUC {}] ❌ 查询失败: {:?} ({} ms)",
                        ruc,
                        reason.unwrap_or(FailureReason::Session),
                        elapsed_ms
                    );
                }
            }
            LookupEvent::BatchFinished {
                total,
                succeeded,
                failed,
                elapsed_ms,
            } => {
                info!(
                    "🏁 批量查询结束: 共 {} 个, 成功 {}, 失败 {}, 耗时 {:.2}s",
                    total,
                    succeeded,
                    failed,
                    *elapsed_ms as f64 / 1000.0
                );
            }
        }
    }
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &LookupEvent) {}
}
