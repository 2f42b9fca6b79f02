//! 测试用的脚本化站点
//!
//! `FakeFactory` 打开的每个 `FakeSession` 模拟一个独立的浏览器上下文：
//! 查询页 → 结果页 → 面板页。每个 RUC 的行为可以单独指定。

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use ruc_lookup::error::SessionError;
use ruc_lookup::events::{EventSink, LookupEvent};
use ruc_lookup::locator::Locator;
use ruc_lookup::session::{DocumentQuery, ElementState, Session, SessionFactory, TableSnapshot};
use ruc_lookup::{Config, LookupFlow, LookupRunner};

pub const SEARCH_URL: &str = "https://fake.sunat.test/cl-ti-itmrconsruc/FrameCriterioBusquedaWeb.jsp";
pub const RESULT_URL: &str = "https://fake.sunat.test/cl-ti-itmrconsruc/jcrS00Alias";

const IDENTITY_XPATH: &str =
    "//h4[contains(text(), 'Número de RUC:')]/parent::div/following-sibling::div//h4";
const ESTADO_XPATH: &str = "//h4[contains(text(), 'Estado del Contribuyente:')]/parent::div/following-sibling::div//p[@class='list-group-item-text']";
const CONDICION_XPATH: &str = "//h4[contains(text(), 'Condición del Contribuyente:')]/parent::div/parent::div//p[@class='list-group-item-text']";

/// 某个 RUC 在站点上的表现
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    Normal,
    /// 提交后弹出原生对话框
    Alert(String),
    /// 对话框阻塞页面，提交调用本身超时
    AlertBlocksSubmit(String),
    /// 结果页永远不出现
    NeverReady,
    /// 提交后远程调用永远不返回
    Hang,
    /// 提交时任务崩溃
    Panic,
    /// 结果页没有基本信息
    NoRecord,
    /// 结果页只有 RUC，没有名称
    NoLegalName,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
    pub released: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct FakeSite {
    behaviors: HashMap<String, Behavior>,
    broken_actions: HashSet<String>,
    /// 每次远程调用的耗时
    latency: Duration,
    /// 点击或直接提交后，过多久才换成面板页
    transition_delay: Duration,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ruc: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(ruc.to_string(), behavior);
        self
    }

    /// 该面板的直接提交会失败
    pub fn broken_panel(mut self, action: &str) -> Self {
        self.broken_actions.insert(action.to_string());
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn transition_delay(mut self, delay: Duration) -> Self {
        self.transition_delay = delay;
        self
    }

    fn behavior(&self, ruc: &str) -> Behavior {
        self.behaviors.get(ruc).cloned().unwrap_or(Behavior::Normal)
    }
}

pub struct FakeFactory {
    site: Arc<FakeSite>,
    counters: Arc<Counters>,
    fail_open: bool,
}

impl FakeFactory {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            counters: Arc::new(Counters::default()),
            fail_open: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(FakeSite::new())
        }
    }

    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open(&self) -> Result<Box<dyn Session>, SessionError> {
        if self.fail_open {
            return Err(SessionError::Init("chromium not found".to_string()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_live.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            site: Arc::clone(&self.site),
            counters: Arc::clone(&self.counters),
            page: Page::Blank,
            pending: None,
            marked: false,
            dialog: None,
            released: false,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Page {
    Blank,
    Search,
    Result { ruc: String, behavior: Behavior },
    Panel { ruc: String, action: String },
}

pub struct FakeSession {
    site: Arc<FakeSite>,
    counters: Arc<Counters>,
    page: Page,
    /// 尚未完成的跳转
    pending: Option<(Instant, Page)>,
    marked: bool,
    dialog: Option<String>,
    released: bool,
}

impl FakeSession {
    async fn remote_call(&mut self) -> Result<(), SessionError> {
        if self.released {
            return Err(SessionError::Closed);
        }
        if !self.site.latency.is_zero() {
            tokio::time::sleep(self.site.latency).await;
        }
        if let Some((at, _)) = &self.pending {
            if Instant::now() >= *at {
                if let Some((_, page)) = self.pending.take() {
                    self.load(page);
                }
            }
        }
        Ok(())
    }

    /// 换成新文档，旧文档上的标记随之消失
    fn load(&mut self, page: Page) {
        self.page = page;
        self.marked = false;
    }

    /// 面板跳转，按站点设置延迟生效
    fn go_to(&mut self, page: Page) {
        if self.site.transition_delay.is_zero() {
            self.load(page);
        } else {
            self.pending = Some((Instant::now() + self.site.transition_delay, page));
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn result_texts(ruc: &str, behavior: &Behavior, locator: &Locator) -> Vec<String> {
        match locator.expression() {
            IDENTITY_XPATH => match behavior {
                Behavior::NoRecord => vec![],
                Behavior::NoLegalName => vec![ruc.to_string()],
                _ => vec![format!("{} - EMPRESA {} S.A.C.", ruc, &ruc[7..])],
            },
            ESTADO_XPATH => vec!["ACTIVO".to_string()],
            CONDICION_XPATH => vec!["  HABIDO  ".to_string()],
            _ => vec![],
        }
    }

    fn panel_texts(action: &str, locator: &Locator) -> Vec<String> {
        match (action, locator.expression()) {
            ("getInfoDC", "div.list-group-item div.col-sm-12") => {
                vec!["No registra deuda en cobranza coactiva".to_string()]
            }
            ("getReactivaPeru", "span.label") => vec!["NO".to_string()],
            ("getReactivaPeru", "h5") => vec![
                "Información actualizada al 31/12/2023".to_string(),
                "Decreto Legislativo N° 1455".to_string(),
            ],
            ("getPGarantiaCOVID19", "h5") => vec!["Ley N° 31050".to_string()],
            _ => vec![],
        }
    }

    fn panel_tables(action: &str, locator: &Locator) -> Vec<TableSnapshot> {
        match (action, locator.expression()) {
            ("getCantTrab", "//table[@class='table']") => vec![TableSnapshot::new(
                ["Periodo", "N° de Trabajadores", "Pensionistas", "Prestadores de Servicio"],
                [
                    vec!["2024-01", "1 024", "3", "10"],
                    vec!["2024-02", "1 030", "3", "12"],
                ],
            )],
            ("getRepLeg", "table") => vec![TableSnapshot::new(
                ["Documento", "Nro. Documento", "Nombre", "Cargo", "Fecha Desde"],
                [
                    vec!["DNI", "01234567", "PEREZ LOPEZ JUAN", "GERENTE GENERAL", "01/01/2015"],
                    vec!["DNI", "07654321", "", "APODERADO", "02/02/2016"],
                ],
            )],
            ("getinfHis", "div.panel-primary table.table") => vec![
                TableSnapshot::new(
                    ["Nombre o Razón Social", "Fecha de Baja"],
                    [vec!["EMPRESA ANTERIOR S.R.L.", "15/06/2012"]],
                ),
                TableSnapshot::new(
                    ["Condición", "Desde", "Hasta"],
                    [vec!["NO HABIDO", "01/01/2010", "01/01/2011"]],
                ),
            ],
            ("getInfoDC", "table") => vec![TableSnapshot::new(
                ["Monto", "Periodo", "Fecha", "Entidad"],
                Vec::<Vec<&str>>::new(),
            )],
            ("getLocAnex", "div.table-responsive table") => vec![TableSnapshot::new(
                ["Código", "Tipo", "Dirección", "Actividad"],
                [
                    vec!["0001", "SUCURSAL", "AV.  AREQUIPA 123", "COMERCIO"],
                    vec!["", "DEPOSITO", "JR. X", "-"],
                ],
            )],
            _ => vec![],
        }
    }
}

#[async_trait]
impl DocumentQuery for FakeSession {
    async fn current_url(&mut self) -> Result<String, SessionError> {
        self.remote_call().await?;
        Ok(match &self.page {
            Page::Blank => "about:blank".to_string(),
            Page::Search => SEARCH_URL.to_string(),
            Page::Result { .. } | Page::Panel { .. } => RESULT_URL.to_string(),
        })
    }

    async fn query_texts(&mut self, locator: &Locator) -> Result<Vec<String>, SessionError> {
        self.remote_call().await?;
        Ok(match &self.page {
            Page::Result { ruc, behavior } => Self::result_texts(ruc, behavior, locator),
            Page::Panel { action, .. } => Self::panel_texts(action, locator),
            _ => vec![],
        })
    }

    async fn query_tables(
        &mut self,
        locator: &Locator,
    ) -> Result<Vec<TableSnapshot>, SessionError> {
        self.remote_call().await?;
        Ok(match &self.page {
            Page::Panel { action, .. } => Self::panel_tables(action, locator),
            _ => vec![],
        })
    }

    async fn element_state(&mut self, locator: &Locator) -> Result<ElementState, SessionError> {
        self.remote_call().await?;
        let expr = locator.expression();
        let state = match &self.page {
            Page::Search if expr == "#txtRuc" => ElementState::Interactive,
            Page::Result { behavior, .. } => match expr {
                "//td[contains(text(), 'RUC')]" if *behavior != Behavior::NoRecord => {
                    ElementState::Present
                }
                ".btnInfNumTra" => ElementState::Interactive,
                ".btnInfRepLeg" => ElementState::Present,
                _ => ElementState::Absent,
            },
            Page::Panel { .. } if expr == "div.panel-primary" || expr == "table.table" => {
                ElementState::Present
            }
            _ => ElementState::Absent,
        };
        Ok(state)
    }

    async fn pending_dialog(&mut self) -> Result<Option<String>, SessionError> {
        self.remote_call().await?;
        Ok(self.dialog.clone())
    }

    async fn page_marked(&mut self) -> Result<bool, SessionError> {
        self.remote_call().await?;
        Ok(self.marked)
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn navigate(&mut self, _url: &str) -> Result<(), SessionError> {
        self.remote_call().await?;
        self.load(Page::Search);
        Ok(())
    }

    async fn submit_form(
        &mut self,
        field_id: &str,
        value: &str,
        submit_id: &str,
    ) -> Result<(), SessionError> {
        self.remote_call().await?;
        assert_eq!((field_id, submit_id), ("txtRuc", "btnAceptar"));
        if self.page != Page::Search {
            return Err(SessionError::Interaction {
                locator: "#txtRuc".to_string(),
                message: "not on search page".to_string(),
            });
        }
        match self.site.behavior(value) {
            Behavior::Alert(message) => self.dialog = Some(message),
            Behavior::AlertBlocksSubmit(message) => {
                self.dialog = Some(message);
                return Err(SessionError::Timeout(Duration::from_secs(30)));
            }
            Behavior::NeverReady => {}
            Behavior::Hang => std::future::pending::<()>().await,
            Behavior::Panic => panic!("simulated worker crash for {}", value),
            behavior => self.load(Page::Result {
                ruc: value.to_string(),
                behavior,
            }),
        }
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), SessionError> {
        self.remote_call().await?;
        match (&self.page, locator.expression()) {
            (Page::Result { ruc, .. }, ".btnInfNumTra") => {
                let page = Page::Panel {
                    ruc: ruc.clone(),
                    action: "getCantTrab".to_string(),
                };
                self.go_to(page);
                Ok(())
            }
            _ => Err(SessionError::Interaction {
                locator: locator.to_string(),
                message: "not clickable".to_string(),
            }),
        }
    }

    async fn direct_submit(
        &mut self,
        action_path: &str,
        fields: &[(String, String)],
    ) -> Result<(), SessionError> {
        self.remote_call().await?;
        assert_eq!(action_path, "/cl-ti-itmrconsruc/jcrS00Alias");
        let field = |name: &str| {
            fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
                .unwrap_or_default()
        };
        let action = field("accion");
        assert!(!field("desRuc").is_empty(), "legal name must be sent");
        if self.site.broken_actions.contains(&action) {
            return Err(SessionError::Script(format!("{} failed", action)));
        }
        self.go_to(Page::Panel {
            ruc: field("nroRuc"),
            action,
        });
        Ok(())
    }

    async fn mark_page(&mut self) -> Result<(), SessionError> {
        self.remote_call().await?;
        self.marked = true;
        Ok(())
    }

    async fn dismiss_dialog(&mut self) -> Result<Option<String>, SessionError> {
        self.remote_call().await?;
        Ok(self.dialog.take())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.release();
        Ok(())
    }

    fn force_release(&mut self) {
        self.release();
    }
}

/// 收集所有事件
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<LookupEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<LookupEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &LookupEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// 短等待时间的配置
pub fn fast_config() -> Config {
    Config {
        target_url: SEARCH_URL.to_string(),
        result_wait_secs: 1,
        trigger_wait_secs: 1,
        panel_wait_secs: 1,
        settle_millis: 0,
        poll_interval_millis: 10,
        per_item_timeout_secs: 120,
        ..Config::default()
    }
}

pub fn runner_with(factory: FakeFactory, events: Arc<dyn EventSink>) -> LookupRunner {
    runner_with_config(factory, events, &fast_config())
}

pub fn runner_with_config(
    factory: FakeFactory,
    events: Arc<dyn EventSink>,
    config: &Config,
) -> LookupRunner {
    LookupRunner::new(Arc::new(factory), LookupFlow::new(config, events))
}
