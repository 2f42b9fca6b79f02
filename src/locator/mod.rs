//! 定位策略
//!
//! 一个逻辑字段对应一组按优先级排列的结构化查询表达式。
//! 依次尝试，第一个命中非空节点集的表达式胜出；全部未命中表示字段不存在，
//! 这不是错误。只有会话本身出错（脚本执行失败、连接断开）才返回 `Err`。

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::SessionError;
use crate::session::DocumentQuery;

/// 单个结构化查询
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    pub fn css(expr: impl Into<String>) -> Self {
        Locator::Css(expr.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Locator::XPath(_) => "xpath",
            Locator::Css(_) => "css",
        }
    }

    pub fn expression(&self) -> &str {
        match self {
            Locator::XPath(expr) | Locator::Css(expr) => expr,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.expression())
    }
}

/// 一个逻辑字段的有序定位策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorStrategy {
    field: String,
    locators: Vec<Locator>,
}

impl LocatorStrategy {
    pub fn new(field: impl Into<String>, locators: Vec<Locator>) -> Self {
        Self {
            field: field.into(),
            locators,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn locators(&self) -> &[Locator] {
        &self.locators
    }
}

/// 按顺序尝试每个表达式，返回第一个非空节点集的文本（已去除两端空白）
pub async fn first_match<D>(
    doc: &mut D,
    locators: &[Locator],
) -> Result<Option<Vec<String>>, SessionError>
where
    D: DocumentQuery + ?Sized,
{
    for locator in locators {
        let texts = doc.query_texts(locator).await?;
        if !texts.is_empty() {
            debug!("定位命中: {} ({} 个节点)", locator, texts.len());
            return Ok(Some(texts.into_iter().map(|t| t.trim().to_string()).collect()));
        }
    }
    Ok(None)
}

/// 字段名 → 定位策略 的注册表
#[derive(Debug, Clone, Default)]
pub struct LocatorResolver {
    strategies: HashMap<String, LocatorStrategy>,
}

impl LocatorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, strategy: LocatorStrategy) -> Self {
        self.strategies.insert(strategy.field().to_string(), strategy);
        self
    }

    pub fn strategy(&self, field: &str) -> Option<&LocatorStrategy> {
        self.strategies.get(field)
    }

    /// 解析单值字段：取命中节点集的第一个节点
    pub async fn resolve_text<D>(
        &self,
        field: &str,
        doc: &mut D,
    ) -> Result<Option<String>, SessionError>
    where
        D: DocumentQuery + ?Sized,
    {
        let Some(strategy) = self.strategies.get(field) else {
            return Ok(None);
        };
        Ok(first_match(doc, strategy.locators())
            .await?
            .and_then(|texts| texts.into_iter().next()))
    }

    /// 解析列表字段：丢弃空文本，全部为空时视为不存在
    pub async fn resolve_list<D>(
        &self,
        field: &str,
        doc: &mut D,
    ) -> Result<Option<Vec<String>>, SessionError>
    where
        D: DocumentQuery + ?Sized,
    {
        let Some(strategy) = self.strategies.get(field) else {
            return Ok(None);
        };
        let items: Vec<String> = first_match(doc, strategy.locators())
            .await?
            .unwrap_or_default()
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect();
        Ok((!items.is_empty()).then_some(items))
    }
}
