//! 单个 RUC 的查询流程 - 流程层
//!
//! 状态机：
//! START → NAVIGATED → QUERY_SUBMITTED → {RESULT_READY | INTERSTITIAL | TIMED_OUT}
//!       → CORE_EXTRACTED → (PANEL_PENDING → PANEL_DONE)* → COMPLETE | FAILED
//!
//! 流程不持有会话，只借用调用方租到的会话。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::LookupError;
use crate::events::{EventSink, LookupEvent};
use crate::extraction::{core_field_resolver, extract_core_record};
use crate::locator::{Locator, LocatorResolver};
use crate::models::{LookupRecord, PanelFlags, PanelKind, PanelReport};
use crate::session::{wait_for, Condition, Session};
use crate::workflow::lookup_ctx::LookupCtx;
use crate::workflow::panel_flow::{panel_spec, PanelFlow};

const RUC_INPUT_ID: &str = "txtRuc";
const SUBMIT_BUTTON_ID: &str = "btnAceptar";
const RESULT_URL_FRAGMENT: &str = "jcrS00Alias";
const RESULT_MARKER_XPATH: &str = "//td[contains(text(), 'RUC')]";

/// 查询状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "panel", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LookupState {
    Start,
    Navigated,
    QuerySubmitted,
    ResultReady,
    Interstitial,
    TimedOut,
    CoreExtracted,
    PanelPending(PanelKind),
    PanelDone(PanelKind),
    Complete,
    Failed,
}

impl fmt::Display for LookupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupState::Start => f.write_str("START"),
            LookupState::Navigated => f.write_str("NAVIGATED"),
            LookupState::QuerySubmitted => f.write_str("QUERY_SUBMITTED"),
            LookupState::ResultReady => f.write_str("RESULT_READY"),
            LookupState::Interstitial => f.write_str("INTERSTITIAL"),
            LookupState::TimedOut => f.write_str("TIMED_OUT"),
            LookupState::CoreExtracted => f.write_str("CORE_EXTRACTED"),
            LookupState::PanelPending(kind) => write!(f, "PANEL_PENDING({})", kind.key()),
            LookupState::PanelDone(kind) => write!(f, "PANEL_DONE({})", kind.key()),
            LookupState::Complete => f.write_str("COMPLETE"),
            LookupState::Failed => f.write_str("FAILED"),
        }
    }
}

/// 查询流程
///
/// - 驱动一个会话走完整个状态机
/// - 决定何时提交、何时等待、何时放弃
/// - 附加面板失败只会让该面板缺省
pub struct LookupFlow {
    target_url: String,
    result_wait: Duration,
    settle_delay: Duration,
    poll_interval: Duration,
    resolver: LocatorResolver,
    panels: PanelFlow,
    events: Arc<dyn EventSink>,
}

impl LookupFlow {
    pub fn new(config: &Config, events: Arc<dyn EventSink>) -> Self {
        Self {
            target_url: config.target_url.clone(),
            result_wait: config.result_wait(),
            settle_delay: config.settle_delay(),
            poll_interval: config.poll_interval(),
            resolver: core_field_resolver(),
            panels: PanelFlow::new(config),
            events,
        }
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    fn enter(&self, ctx: &LookupCtx, state: LookupState) {
        self.events.emit(&LookupEvent::StateChanged {
            ruc: ctx.ruc.to_string(),
            state,
        });
    }

    /// 在给定会话上完成一次查询
    pub async fn run(
        &self,
        session: &mut dyn Session,
        ctx: &LookupCtx,
        panels: &PanelFlags,
    ) -> Result<LookupRecord, LookupError> {
        self.enter(ctx, LookupState::Start);
        let result = self.drive(session, ctx, panels).await;
        match &result {
            Ok(_) => self.enter(ctx, LookupState::Complete),
            Err(e) => {
                warn!("{} ❌ {}", ctx, e);
                self.enter(ctx, LookupState::Failed);
            }
        }
        result
    }

    async fn drive(
        &self,
        session: &mut dyn Session,
        ctx: &LookupCtx,
        panels: &PanelFlags,
    ) -> Result<LookupRecord, LookupError> {
        // ========== 打开查询页 ==========
        session
            .navigate(&self.target_url)
            .await
            .map_err(LookupError::Navigation)?;
        self.enter(ctx, LookupState::Navigated);

        let input_ready = Condition::Interactive(Locator::css(format!("#{}", RUC_INPUT_ID)));
        wait_for(session, &input_ready, self.result_wait, self.poll_interval).await;

        // ========== 提交查询 ==========
        let submitted = session
            .submit_form(RUC_INPUT_ID, ctx.ruc.as_str(), SUBMIT_BUTTON_ID)
            .await;
        self.enter(ctx, LookupState::QuerySubmitted);
        if let Err(e) = submitted {
            // 对话框会阻塞页面，提交调用本身可能因此失败
            return match session.dismiss_dialog().await {
                Ok(Some(message)) => {
                    self.enter(ctx, LookupState::Interstitial);
                    Err(LookupError::InterstitialRejected { message })
                }
                _ => Err(LookupError::Session(e)),
            };
        }

        self.await_result(session, ctx).await?;
        sleep(self.settle_delay).await;

        // ========== 基本信息 ==========
        let fields = extract_core_record(session, &self.resolver)
            .await
            .map_err(LookupError::Session)?
            .ok_or(LookupError::NoRecord)?;
        let mut record = LookupRecord::new(ctx.ruc.clone(), fields);
        self.enter(ctx, LookupState::CoreExtracted);
        info!("{} ✓ 基本信息提取完成", ctx);

        // ========== 附加面板 ==========
        if panels.is_empty() {
            return Ok(record);
        }
        let Some(legal_name) = record.legal_name().map(str::to_string) else {
            for kind in panels.enabled() {
                self.events.emit(&LookupEvent::PanelSkipped {
                    ruc: ctx.ruc.to_string(),
                    panel: kind,
                    reason: "缺少名称".to_string(),
                });
            }
            return Ok(record);
        };

        for kind in panels.enabled() {
            self.enter(ctx, LookupState::PanelPending(kind));
            let outcome = self
                .panels
                .run(session, panel_spec(kind), ctx, &legal_name)
                .await;
            let found = match outcome {
                Ok(Some(data)) => {
                    record.attach_panel(PanelReport::new(kind, data));
                    true
                }
                Ok(None) => false,
                Err(e) => {
                    warn!("{} ⚠️ 面板 {} 提取失败: {}", ctx, kind, e);
                    false
                }
            };
            self.events.emit(&LookupEvent::PanelFinished {
                ruc: ctx.ruc.to_string(),
                panel: kind,
                found,
            });
            self.enter(ctx, LookupState::PanelDone(kind));
        }

        Ok(record)
    }

    /// 等待结果页、对话框或超时
    async fn await_result(
        &self,
        session: &mut dyn Session,
        ctx: &LookupCtx,
    ) -> Result<(), LookupError> {
        let result_ready = Condition::any([
            Condition::DialogOpen,
            Condition::UrlContains(RESULT_URL_FRAGMENT.to_string()),
            Condition::Exists(Locator::xpath(RESULT_MARKER_XPATH)),
        ]);
        let met = wait_for(session, &result_ready, self.result_wait, self.poll_interval).await;

        let dialog = session
            .dismiss_dialog()
            .await
            .map_err(LookupError::Session)?;
        if let Some(message) = dialog {
            self.enter(ctx, LookupState::Interstitial);
            return Err(LookupError::InterstitialRejected { message });
        }

        if met {
            self.enter(ctx, LookupState::ResultReady);
            Ok(())
        } else {
            self.enter(ctx, LookupState::TimedOut);
            Err(LookupError::ResultTimeout {
                waited: self.result_wait,
            })
        }
    }
}
