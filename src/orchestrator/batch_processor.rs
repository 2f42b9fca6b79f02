//! 批量查询调度器 - 编排层
//!
//! ## 职责
//!
//! 1. **格式校验**：不合法的 RUC 直接生成失败记录，不占用并发名额
//! 2. **并发控制**：使用 Semaphore 限制同时运行的查询数（上限 5）
//! 3. **单项超时**：超时后取消任务，会话租约随之释放
//! 4. **结果收集**：通过 mpsc 通道按完成顺序收集，每个输入恰好一条记录
//!
//! 并发数为 1 时按顺序逐个执行，输出结构完全相同。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::time::{timeout, Instant};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{BatchError, ConfigError};
use crate::events::LookupEvent;
use crate::models::{BatchResult, FailureReason, LookupFailure, LookupOutcome, PanelFlags, Ruc};
use crate::orchestrator::lookup_runner::LookupRunner;
use crate::workflow::LookupCtx;

/// 并发数上限
pub const MAX_CONCURRENCY: usize = 5;

/// 批量查询选项
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub concurrency_limit: usize,
    pub per_item_timeout: Duration,
    pub panels: PanelFlags,
}

impl BatchOptions {
    pub fn new(concurrency_limit: usize, per_item_timeout: Duration, panels: PanelFlags) -> Self {
        Self {
            concurrency_limit,
            per_item_timeout,
            panels,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.max_concurrent_lookups,
            config.per_item_timeout(),
            config.panel_flags()?,
        ))
    }

    /// 实际使用的并发数
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency_limit.min(MAX_CONCURRENCY)
    }

    fn validate(&self) -> Result<(), BatchError> {
        if self.concurrency_limit == 0 {
            return Err(BatchError::InvalidConcurrency(self.concurrency_limit));
        }
        if self.per_item_timeout.is_zero() {
            return Err(BatchError::InvalidTimeout);
        }
        Ok(())
    }
}

/// 批量查询
///
/// 只有选项本身不合法时才返回错误；单个 RUC 的任何失败都记录在结果里
pub async fn run_batch(
    runner: &LookupRunner,
    identifiers: &[String],
    options: &BatchOptions,
) -> Result<BatchResult, BatchError> {
    options.validate()?;
    let started = Instant::now();
    let total = identifiers.len();
    let concurrency = options.effective_concurrency();
    if concurrency < options.concurrency_limit {
        warn!(
            "⚠️ 并发数 {} 超过上限，按 {} 执行",
            options.concurrency_limit, concurrency
        );
    }
    runner.events().emit(&LookupEvent::BatchStarted { total, concurrency });

    let (tx, mut rx) = mpsc::unbounded_channel::<LookupOutcome>();

    // 格式校验：不合法的直接出结果
    let mut pending = Vec::new();
    for (idx, raw) in identifiers.iter().enumerate() {
        match Ruc::parse(raw) {
            Ok(ruc) => pending.push(LookupCtx::new(ruc, idx + 1, total)),
            Err(e) => {
                let _ = tx.send(runner.reject(raw, e.into()));
            }
        }
    }

    if concurrency == 1 {
        info!("📋 顺序模式: {} 个待查询", pending.len());
        for ctx in pending {
            let outcome = run_guarded(runner, ctx, &options.panels, options.per_item_timeout).await;
            let _ = tx.send(outcome);
        }
    } else {
        info!("📋 并发模式: {} 个待查询, 并发数 {}", pending.len(), concurrency);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut handles = Vec::new();

        for ctx in pending {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("{} 获取并发名额失败: {}", ctx, e);
                    let _ = tx.send(crashed(&ctx.ruc, e.to_string()));
                    continue;
                }
            };

            let worker = runner.clone();
            let panels = options.panels.clone();
            let per_item_timeout = options.per_item_timeout;
            let tx = tx.clone();
            let ruc = ctx.ruc.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let outcome = run_guarded(&worker, ctx, &panels, per_item_timeout).await;
                let _ = tx.send(outcome);
            });
            handles.push((ruc, handle));
        }

        // 等待所有任务完成
        for (ruc, handle) in handles {
            if let Err(e) = handle.await {
                error!("[RUC {}] 任务执行失败: {}", ruc, e);
                let _ = tx.send(crashed(&ruc, e.to_string()));
            }
        }
    }

    drop(tx);
    let mut results = Vec::with_capacity(total);
    while let Some(outcome) = rx.recv().await {
        results.push(outcome);
    }

    let result = BatchResult::from_outcomes(results, started.elapsed());
    runner.events().emit(&LookupEvent::BatchFinished {
        total: result.total,
        succeeded: result.succeeded,
        failed: result.failed,
        elapsed_ms: result.elapsed.as_millis() as u64,
    });
    Ok(result)
}

fn crashed(ruc: &Ruc, message: String) -> LookupOutcome {
    LookupOutcome::Failed(LookupFailure::new(
        ruc.as_str(),
        FailureReason::WorkerCrashed,
        message,
    ))
}

/// 在独立任务中运行单个查询，并加上整体超时
///
/// 超时后 abort 任务并等待它结束，任务里的会话租约在此之前已被 drop
async fn run_guarded(
    runner: &LookupRunner,
    ctx: LookupCtx,
    panels: &PanelFlags,
    per_item_timeout: Duration,
) -> LookupOutcome {
    let ruc = ctx.ruc.clone();
    let worker = runner.clone();
    let panels = panels.clone();
    let mut handle = tokio::spawn(async move { worker.lookup_valid(ctx, &panels).await });

    match timeout(per_item_timeout, &mut handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            error!("[RUC {}] 💥 查询任务崩溃: {}", ruc, e);
            runner.finish(ruc.as_str(), Some(FailureReason::WorkerCrashed), 0);
            crashed(&ruc, format!("查询任务崩溃: {}", e))
        }
        Err(_) => {
            handle.abort();
            let _ = handle.await;
            warn!("[RUC {}] ⏱️ 查询超时 ({:?})，已强制释放会话", ruc, per_item_timeout);
            let elapsed_ms = per_item_timeout.as_millis() as u64;
            runner.finish(ruc.as_str(), Some(FailureReason::WorkerTimeout), elapsed_ms);
            LookupOutcome::Failed(LookupFailure::new(
                ruc.as_str(),
                FailureReason::WorkerTimeout,
                format!("查询超时 ({} 秒)", per_item_timeout.as_secs()),
            ))
        }
    }
}
