//! 单元测试用的静态文档

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::SessionError;
use crate::locator::Locator;
use crate::session::{DocumentQuery, ElementState, TableSnapshot};

#[derive(Debug, Default, Clone)]
pub struct StaticDocument {
    url: String,
    texts: HashMap<Locator, Vec<String>>,
    tables: HashMap<Locator, Vec<TableSnapshot>>,
    states: HashMap<Locator, ElementState>,
    dialog: Option<String>,
    marked: bool,
    failing: bool,
    url_fails: bool,
}

impl StaticDocument {
    pub fn at_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_texts(mut self, locator: Locator, texts: &[&str]) -> Self {
        self.texts
            .insert(locator, texts.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_tables(mut self, locator: Locator, tables: Vec<TableSnapshot>) -> Self {
        self.tables.insert(locator, tables);
        self
    }

    pub fn with_state(mut self, locator: Locator, state: ElementState) -> Self {
        self.states.insert(locator, state);
        self
    }

    pub fn with_dialog(mut self, message: &str) -> Self {
        self.dialog = Some(message.to_string());
        self
    }

    /// 带有页面标记，相当于还停在标记时的文档
    pub fn marked(mut self) -> Self {
        self.marked = true;
        self
    }

    /// 只有读取 URL 会失败
    pub fn failing_url(mut self) -> Self {
        self.url_fails = true;
        self
    }

    /// 所有查询都返回错误
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn guard(&self) -> Result<(), SessionError> {
        if self.failing {
            Err(SessionError::Script("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentQuery for StaticDocument {
    async fn current_url(&mut self) -> Result<String, SessionError> {
        self.guard()?;
        if self.url_fails {
            return Err(SessionError::Timeout(std::time::Duration::from_secs(30)));
        }
        Ok(self.url.clone())
    }

    async fn query_texts(&mut self, locator: &Locator) -> Result<Vec<String>, SessionError> {
        self.guard()?;
        Ok(self.texts.get(locator).cloned().unwrap_or_default())
    }

    async fn query_tables(
        &mut self,
        locator: &Locator,
    ) -> Result<Vec<TableSnapshot>, SessionError> {
        self.guard()?;
        Ok(self.tables.get(locator).cloned().unwrap_or_default())
    }

    async fn element_state(&mut self, locator: &Locator) -> Result<ElementState, SessionError> {
        self.guard()?;
        if let Some(state) = self.states.get(locator) {
            return Ok(*state);
        }
        let present = self.texts.get(locator).is_some_and(|t| !t.is_empty())
            || self.tables.get(locator).is_some_and(|t| !t.is_empty());
        Ok(if present {
            ElementState::Interactive
        } else {
            ElementState::Absent
        })
    }

    async fn pending_dialog(&mut self) -> Result<Option<String>, SessionError> {
        self.guard()?;
        Ok(self.dialog.clone())
    }

    async fn page_marked(&mut self) -> Result<bool, SessionError> {
        self.guard()?;
        Ok(self.marked)
    }
}
