//! 基于 chromiumoxide 的会话实现

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::Browser;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::browser;
use crate::config::Config;
use crate::error::SessionError;
use crate::infrastructure::JsExecutor;
use crate::locator::Locator;
use crate::session::{scripts, DocumentQuery, ElementState, Session, SessionFactory, TableSnapshot};

/// 一个 Chromium 进程 + 一个页面
pub struct ChromeSession {
    browser: Option<Browser>,
    executor: JsExecutor,
    handler_task: Option<JoinHandle<()>>,
    dialog_task: Option<JoinHandle<()>>,
    pending_dialog: Arc<Mutex<Option<String>>>,
    profile_dir: Option<TempDir>,
}

impl ChromeSession {
    /// 启动独立浏览器并打开空白页
    pub async fn open(config: &Config) -> Result<Self, SessionError> {
        let profile_dir = tempfile::Builder::new()
            .prefix("ruc-lookup-")
            .tempdir()
            .map_err(|e| SessionError::Init(format!("无法创建用户目录: {}", e)))?;

        let (browser, handler_task) =
            browser::launch_isolated_browser(config, profile_dir.path()).await?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Init(format!("创建页面失败: {}", e)))?;

        // 记录页面弹出的原生对话框
        let mut dialogs = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| SessionError::Init(format!("订阅对话框事件失败: {}", e)))?;
        let pending_dialog = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&pending_dialog);
        let dialog_task = tokio::spawn(async move {
            while let Some(event) = dialogs.next().await {
                debug!("页面弹出对话框: {}", event.message);
                if let Ok(mut guard) = slot.lock() {
                    *guard = Some(event.message.clone());
                }
            }
        });

        Ok(Self {
            browser: Some(browser),
            executor: JsExecutor::new(page, config.request_timeout()),
            handler_task: Some(handler_task),
            dialog_task: Some(dialog_task),
            pending_dialog,
            profile_dir: Some(profile_dir),
        })
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.browser.is_some() {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }

    fn abort_tasks(&mut self) {
        if let Some(task) = self.dialog_task.take() {
            task.abort();
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }

    /// 原生点击；找不到元素或点击失败时返回错误
    async fn native_click(&self, selector: &str) -> Result<(), SessionError> {
        let page = self.executor.page();
        let element = timeout(self.executor.call_timeout(), page.find_element(selector))
            .await
            .map_err(|_| SessionError::Timeout(self.executor.call_timeout()))??;
        element.scroll_into_view().await?;
        element.click().await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentQuery for ChromeSession {
    async fn current_url(&mut self) -> Result<String, SessionError> {
        self.ensure_open()?;
        let url = self.executor.page().url().await?;
        Ok(url.unwrap_or_default())
    }

    async fn query_texts(&mut self, locator: &Locator) -> Result<Vec<String>, SessionError> {
        self.ensure_open()?;
        self.executor.eval_as(scripts::query_texts(locator)).await
    }

    async fn query_tables(
        &mut self,
        locator: &Locator,
    ) -> Result<Vec<TableSnapshot>, SessionError> {
        self.ensure_open()?;
        self.executor.eval_as(scripts::query_tables(locator)).await
    }

    async fn element_state(&mut self, locator: &Locator) -> Result<ElementState, SessionError> {
        self.ensure_open()?;
        self.executor.eval_as(scripts::element_state(locator)).await
    }

    async fn pending_dialog(&mut self) -> Result<Option<String>, SessionError> {
        self.ensure_open()?;
        Ok(self
            .pending_dialog
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default())
    }

    async fn page_marked(&mut self) -> Result<bool, SessionError> {
        self.ensure_open()?;
        self.executor.eval_as(scripts::page_marked()).await
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let navigation = |message: String| SessionError::Navigation {
            url: url.to_string(),
            message,
        };
        timeout(self.executor.call_timeout(), self.executor.page().goto(url))
            .await
            .map_err(|_| navigation("页面加载超时".to_string()))?
            .map_err(|e| navigation(e.to_string()))?;
        Ok(())
    }

    async fn submit_form(
        &mut self,
        field_id: &str,
        value: &str,
        submit_id: &str,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        let cleared: bool = self.executor.eval_as(scripts::clear_input(field_id)).await?;
        if !cleared {
            return Err(SessionError::Interaction {
                locator: format!("#{}", field_id),
                message: "输入框不存在".to_string(),
            });
        }

        let page = self.executor.page();
        let input = timeout(
            self.executor.call_timeout(),
            page.find_element(format!("#{}", field_id)),
        )
        .await
        .map_err(|_| SessionError::Timeout(self.executor.call_timeout()))??;
        input.click().await?;
        input.type_str(value).await?;

        self.native_click(&format!("#{}", submit_id)).await
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), SessionError> {
        self.ensure_open()?;
        if let Locator::Css(selector) = locator {
            match self.native_click(selector).await {
                Ok(()) => return Ok(()),
                Err(e) => debug!("原生点击失败，改用脚本点击 ({}): {}", locator, e),
            }
        }
        let clicked: bool = self.executor.eval_as(scripts::click(locator)).await?;
        if clicked {
            Ok(())
        } else {
            Err(SessionError::Interaction {
                locator: locator.to_string(),
                message: "元素不存在".to_string(),
            })
        }
    }

    async fn direct_submit(
        &mut self,
        action_path: &str,
        fields: &[(String, String)],
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.executor
            .eval(scripts::direct_submit(action_path, fields))
            .await?;
        Ok(())
    }

    async fn mark_page(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.executor.eval(scripts::mark_page()).await?;
        Ok(())
    }

    async fn dismiss_dialog(&mut self) -> Result<Option<String>, SessionError> {
        self.ensure_open()?;
        let message = self
            .pending_dialog
            .lock()
            .map(|mut guard| guard.take())
            .unwrap_or_default();
        if message.is_some() {
            self.executor
                .page()
                .execute(HandleJavaScriptDialogParams::new(true))
                .await?;
        }
        Ok(message)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if let Some(mut browser) = self.browser.take() {
            let wait = self.executor.call_timeout();
            let closed = timeout(wait, async {
                browser.close().await?;
                browser.wait().await.map_err(|e| SessionError::Script(e.to_string()))?;
                Ok::<(), SessionError>(())
            })
            .await;
            match closed {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("关闭浏览器失败: {}", e),
                Err(_) => warn!("关闭浏览器超时，进程将被强制结束"),
            }
            // 若进程仍在运行，Browser 的 drop 会结束它
            drop(browser);
        }
        self.abort_tasks();
        self.profile_dir.take();
        Ok(())
    }

    fn force_release(&mut self) {
        self.abort_tasks();
        self.browser.take();
        self.profile_dir.take();
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.force_release();
    }
}

/// 每次调用都启动新的 Chromium 进程
pub struct ChromeSessionFactory {
    config: Arc<Config>,
}

impl ChromeSessionFactory {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> Result<Box<dyn Session>, SessionError> {
        let session = ChromeSession::open(&self.config).await?;
        Ok(Box::new(session))
    }
}
