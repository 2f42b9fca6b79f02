//! 单个 RUC 查询器
//!
//! 租一个新会话 → 跑查询流程 → 关闭会话 → 转换成结果记录。
//! 任何失败都会变成失败记录，不会向上抛出。

use std::sync::Arc;

use tokio::time::Instant;

use crate::error::{BatchError, LookupError};
use crate::events::{EventSink, LookupEvent};
use crate::models::{BatchResult, FailureReason, LookupFailure, LookupOutcome, PanelFlags, Ruc};
use crate::orchestrator::batch_processor::{self, BatchOptions};
use crate::session::{SessionFactory, SessionLease};
use crate::workflow::{LookupCtx, LookupFlow};

/// 查询器，可以廉价 clone 后交给并发任务
#[derive(Clone)]
pub struct LookupRunner {
    factory: Arc<dyn SessionFactory>,
    flow: Arc<LookupFlow>,
}

impl LookupRunner {
    pub fn new(factory: Arc<dyn SessionFactory>, flow: LookupFlow) -> Self {
        Self {
            factory,
            flow: Arc::new(flow),
        }
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        self.flow.events()
    }

    /// 查询单个 RUC
    ///
    /// 格式不合法时直接返回失败记录，不会打开会话
    pub async fn lookup_one(&self, identifier: &str, panels: &PanelFlags) -> LookupOutcome {
        match Ruc::parse(identifier) {
            Ok(ruc) => self.lookup_valid(LookupCtx::single(ruc), panels).await,
            Err(e) => self.reject(identifier, e.into()),
        }
    }

    /// 批量查询，见 [`batch_processor::run_batch`]
    pub async fn run_batch(
        &self,
        identifiers: &[String],
        options: &BatchOptions,
    ) -> Result<BatchResult, BatchError> {
        batch_processor::run_batch(self, identifiers, options).await
    }

    pub(crate) fn reject(&self, identifier: &str, error: LookupError) -> LookupOutcome {
        let failure = LookupFailure::new(identifier, error.reason(), error.to_string());
        self.finish(identifier, Some(failure.reason), 0);
        LookupOutcome::Failed(failure)
    }

    pub(crate) fn finish(&self, identifier: &str, reason: Option<FailureReason>, elapsed_ms: u64) {
        self.events().emit(&LookupEvent::LookupFinished {
            ruc: identifier.to_string(),
            success: reason.is_none(),
            reason,
            elapsed_ms,
        });
    }

    /// 已校验的 RUC：独占一个会话完成查询
    pub(crate) async fn lookup_valid(&self, ctx: LookupCtx, panels: &PanelFlags) -> LookupOutcome {
        let identifier = ctx.ruc.to_string();
        let started = Instant::now();
        self.events().emit(&LookupEvent::LookupStarted {
            ruc: identifier.clone(),
        });

        let result = match SessionLease::open(self.factory.as_ref()).await {
            Ok(mut lease) => {
                let result = match lease.session() {
                    Ok(session) => self.flow.run(session, &ctx, panels).await,
                    Err(e) => Err(LookupError::Session(e)),
                };
                lease.close().await;
                result
            }
            Err(e) => Err(LookupError::SessionInit(e)),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(record) => {
                self.finish(&identifier, None, elapsed_ms);
                LookupOutcome::Found(record)
            }
            Err(e) => {
                let failure = LookupFailure::new(identifier.as_str(), e.reason(), e.to_string());
                self.finish(&identifier, Some(failure.reason), elapsed_ms);
                LookupOutcome::Failed(failure)
            }
        }
    }
}
