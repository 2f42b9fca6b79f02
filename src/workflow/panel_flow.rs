//! 附加面板流程
//!
//! 七个面板共用一个通用流程，差异全部写在 `PANEL_SPECS` 表里：
//! 1. 判断触发按钮是否可点击 → 点击 / 直接提交隐藏表单
//! 2. 等待上一页被替换，再等待面板页加载
//! 3. 按面板的提取方式读取数据

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::PanelError;
use crate::extraction::{
    extract_history, extract_relief_status, extract_table, table_cascade, Column, ColumnSpec,
    ReliefKeys, COVID19_KEYS, REACTIVA_KEYS,
};
use crate::locator::{first_match, Locator};
use crate::models::{PanelData, PanelKind};
use crate::session::{wait_for, Condition, Session};
use crate::workflow::lookup_ctx::LookupCtx;

const DEBT_NOTICE_SELECTOR: &str = "div.list-group-item div.col-sm-12";
const DEBT_DEFAULT_NOTICE: &str = "No se encontró información de deuda coactiva";

const WORKFORCE_COLUMNS: ColumnSpec = ColumnSpec::new(&[
    Column::required("periodo"),
    Column::numeric("trabajadores"),
    Column::numeric("pensionistas"),
    Column::numeric("prestadores_servicio"),
]);

const LEGAL_REP_COLUMNS: ColumnSpec = ColumnSpec::new(&[
    Column::text("tipo_documento"),
    Column::text("nro_documento"),
    Column::required("nombre"),
    Column::text("cargo"),
    Column::text("fecha_desde"),
]);

const DEBT_COLUMNS: ColumnSpec = ColumnSpec::new(&[
    Column::required("monto"),
    Column::required("periodo_tributario"),
    Column::text("fecha_inicio_cobranza"),
    Column::text("entidad"),
])
.with_header_marker(4, "Monto");

const BRANCH_COLUMNS: ColumnSpec = ColumnSpec::new(&[
    Column::required("codigo"),
    Column::text("tipo_establecimiento"),
    Column::text("direccion"),
    Column::text("actividad_economica"),
]);

/// 面板页的提取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelExtractor {
    Table(ColumnSpec),
    /// 表格；没有记录时读取页面上的说明文字，视为"不适用"
    CoerciveDebt(ColumnSpec),
    History,
    Relief(ReliefKeys),
}

/// 一个面板的完整描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSpec {
    pub kind: PanelKind,
    /// 结果页上的触发按钮（CSS 选择器）
    pub trigger: &'static str,
    /// 直接提交时的 `accion` 参数
    pub action: &'static str,
    /// 面板页加载完成的标志（CSS 选择器）
    pub readiness: &'static str,
    pub extractor: PanelExtractor,
}

pub const PANEL_SPECS: [PanelSpec; 7] = [
    PanelSpec {
        kind: PanelKind::Workforce,
        trigger: ".btnInfNumTra",
        action: "getCantTrab",
        readiness: "table.table",
        extractor: PanelExtractor::Table(WORKFORCE_COLUMNS),
    },
    PanelSpec {
        kind: PanelKind::LegalRepresentatives,
        trigger: ".btnInfRepLeg",
        action: "getRepLeg",
        readiness: "table.table",
        extractor: PanelExtractor::Table(LEGAL_REP_COLUMNS),
    },
    PanelSpec {
        kind: PanelKind::History,
        trigger: ".btnInfHis",
        action: "getinfHis",
        readiness: "div.panel-primary",
        extractor: PanelExtractor::History,
    },
    PanelSpec {
        kind: PanelKind::CoerciveDebt,
        trigger: ".btnInfDeuCoa",
        action: "getInfoDC",
        readiness: "div.panel-primary",
        extractor: PanelExtractor::CoerciveDebt(DEBT_COLUMNS),
    },
    PanelSpec {
        kind: PanelKind::ReactivaPeru,
        trigger: ".btnInfReaPer",
        action: "getReactivaPeru",
        readiness: "div.panel-primary",
        extractor: PanelExtractor::Relief(REACTIVA_KEYS),
    },
    PanelSpec {
        kind: PanelKind::Covid19Guarantee,
        trigger: ".btnInfCovid",
        action: "getPGarantiaCOVID19",
        readiness: "div.panel-primary",
        extractor: PanelExtractor::Relief(COVID19_KEYS),
    },
    PanelSpec {
        kind: PanelKind::Branches,
        trigger: ".btnInfLocAnex",
        action: "getLocAnex",
        readiness: "table.table",
        extractor: PanelExtractor::Table(BRANCH_COLUMNS),
    },
];

pub fn panel_spec(kind: PanelKind) -> &'static PanelSpec {
    match kind {
        PanelKind::Workforce => &PANEL_SPECS[0],
        PanelKind::LegalRepresentatives => &PANEL_SPECS[1],
        PanelKind::History => &PANEL_SPECS[2],
        PanelKind::CoerciveDebt => &PANEL_SPECS[3],
        PanelKind::ReactivaPeru => &PANEL_SPECS[4],
        PanelKind::Covid19Guarantee => &PANEL_SPECS[5],
        PanelKind::Branches => &PANEL_SPECS[6],
    }
}

/// 进入面板页的方式，每次面板尝试只决定一次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 触发按钮在等待时间内可点击
    Interactive,
    /// 直接提交隐藏表单
    SyntheticSubmit,
}

/// 隐藏表单的字段
pub fn synthetic_fields(action: &str, ruc: &str, legal_name: &str) -> Vec<(String, String)> {
    vec![
        ("accion".to_string(), action.to_string()),
        ("contexto".to_string(), "ti-it".to_string()),
        ("modo".to_string(), "1".to_string()),
        ("nroRuc".to_string(), ruc.to_string()),
        ("desRuc".to_string(), legal_name.to_string()),
    ]
}

/// 通用面板流程
#[derive(Debug, Clone)]
pub struct PanelFlow {
    submit_action_path: String,
    trigger_wait: Duration,
    panel_wait: Duration,
    settle_delay: Duration,
    poll_interval: Duration,
}

impl PanelFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            submit_action_path: config.submit_action_path.clone(),
            trigger_wait: config.trigger_wait(),
            panel_wait: config.panel_wait(),
            settle_delay: config.settle_delay(),
            poll_interval: config.poll_interval(),
        }
    }

    pub async fn resolve_transition(&self, session: &mut dyn Session, spec: &PanelSpec) -> Transition {
        let trigger = Condition::Interactive(Locator::css(spec.trigger));
        if wait_for(session, &trigger, self.trigger_wait, self.poll_interval).await {
            Transition::Interactive
        } else {
            Transition::SyntheticSubmit
        }
    }

    /// 执行一个面板，返回 `None` 表示该面板没有数据
    pub async fn run(
        &self,
        session: &mut dyn Session,
        spec: &PanelSpec,
        ctx: &LookupCtx,
        legal_name: &str,
    ) -> Result<Option<PanelData>, PanelError> {
        let transition = self.resolve_transition(session, spec).await;
        info!("{} 📂 打开面板 {} ({:?})", ctx, spec.kind, transition);

        // 面板页的就绪选择器在上一页也可能存在，先确认文档已被替换
        session.mark_page().await?;
        let started = Instant::now();
        match transition {
            Transition::Interactive => session.click(&Locator::css(spec.trigger)).await?,
            Transition::SyntheticSubmit => {
                let fields = synthetic_fields(spec.action, ctx.ruc.as_str(), legal_name);
                session
                    .direct_submit(&self.submit_action_path, &fields)
                    .await?
            }
        }

        let left_page = Condition::any([Condition::DialogOpen, Condition::PageReplaced]);
        let replaced = wait_for(session, &left_page, self.panel_wait, self.poll_interval).await;
        if let Some(message) = session.dismiss_dialog().await? {
            return Err(PanelError::Dialog(message));
        }
        if !replaced {
            return Err(PanelError::NotLoaded(self.panel_wait));
        }

        let ready = Condition::any([
            Condition::DialogOpen,
            Condition::Exists(Locator::css(spec.readiness)),
        ]);
        let remaining = self.panel_wait.saturating_sub(started.elapsed());
        if !wait_for(session, &ready, remaining, self.poll_interval).await {
            debug!("{} 面板 {} 未在 {:?} 内加载完成", ctx, spec.kind, self.panel_wait);
        }
        if let Some(message) = session.dismiss_dialog().await? {
            return Err(PanelError::Dialog(message));
        }
        sleep(self.settle_delay).await;

        extract_panel(session, &spec.extractor).await
    }
}

/// 在当前面板页上运行提取
pub async fn extract_panel(
    session: &mut dyn Session,
    extractor: &PanelExtractor,
) -> Result<Option<PanelData>, PanelError> {
    let cascade = table_cascade();
    let data = match extractor {
        PanelExtractor::Table(columns) => extract_table(session, &cascade, columns)
            .await?
            .filter(|rows| !rows.is_empty())
            .map(PanelData::Rows),
        PanelExtractor::CoerciveDebt(columns) => {
            let rows = extract_table(session, &cascade, columns)
                .await?
                .unwrap_or_default();
            if rows.is_empty() {
                let message = first_match(session, &[Locator::css(DEBT_NOTICE_SELECTOR)])
                    .await?
                    .and_then(|texts| texts.into_iter().find(|t| !t.is_empty()))
                    .unwrap_or_else(|| DEBT_DEFAULT_NOTICE.to_string());
                Some(PanelData::NotApplicable { message })
            } else {
                Some(PanelData::Rows(rows))
            }
        }
        PanelExtractor::History => extract_history(session, &cascade)
            .await?
            .map(PanelData::History),
        PanelExtractor::Relief(keys) => extract_relief_status(session, keys)
            .await?
            .map(PanelData::Status),
    };
    Ok(data)
}
