//! 文档查询能力与等待条件

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::SessionError;
use crate::locator::Locator;

/// 元素在当前页面上的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Absent,
    /// 已挂载但不可见或被禁用
    Present,
    Interactive,
}

/// 页面上一张表格的快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TableSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableSnapshot {
    pub fn new<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

/// 只读的文档查询能力
///
/// 查询未命中返回空集合，只有远程调用本身失败才返回错误
#[async_trait]
pub trait DocumentQuery: Send {
    async fn current_url(&mut self) -> Result<String, SessionError>;

    /// 定位节点并返回各节点的文本
    async fn query_texts(&mut self, locator: &Locator) -> Result<Vec<String>, SessionError>;

    /// 定位表格并返回表头和数据行
    async fn query_tables(&mut self, locator: &Locator)
        -> Result<Vec<TableSnapshot>, SessionError>;

    async fn element_state(&mut self, locator: &Locator) -> Result<ElementState, SessionError>;

    /// 当前是否有未处理的原生对话框，有则返回其文本
    async fn pending_dialog(&mut self) -> Result<Option<String>, SessionError>;

    /// 当前文档是否仍带有 `Session::mark_page` 留下的标记
    async fn page_marked(&mut self) -> Result<bool, SessionError>;
}

/// 等待条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    UrlContains(String),
    Exists(Locator),
    Interactive(Locator),
    DialogOpen,
    /// 标记过的文档已被替换
    PageReplaced,
    /// 任一子条件满足即可，按顺序检查
    AnyOf(Vec<Condition>),
}

impl Condition {
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::AnyOf(conditions.into_iter().collect())
    }

    fn leaves(&self) -> Vec<&Condition> {
        match self {
            Condition::AnyOf(children) => children.iter().flat_map(Condition::leaves).collect(),
            leaf => vec![leaf],
        }
    }
}

async fn check_leaf<D>(doc: &mut D, leaf: &Condition) -> Result<bool, SessionError>
where
    D: DocumentQuery + ?Sized,
{
    let satisfied = match leaf {
        Condition::UrlContains(fragment) => doc.current_url().await?.contains(fragment.as_str()),
        Condition::Exists(locator) => doc.element_state(locator).await? != ElementState::Absent,
        Condition::Interactive(locator) => {
            doc.element_state(locator).await? == ElementState::Interactive
        }
        Condition::DialogOpen => doc.pending_dialog().await?.is_some(),
        Condition::PageReplaced => !doc.page_marked().await?,
        Condition::AnyOf(_) => false,
    };
    Ok(satisfied)
}

/// 检查一次条件
///
/// 某个子条件查询失败时继续检查其余子条件；没有子条件满足时才返回第一个错误
pub async fn check<D>(doc: &mut D, condition: &Condition) -> Result<bool, SessionError>
where
    D: DocumentQuery + ?Sized,
{
    let mut first_error = None;
    for leaf in condition.leaves() {
        match check_leaf(doc, leaf).await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) => {
                debug!("条件 {:?} 检查失败: {}", leaf, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(false),
    }
}

/// 轮询直到条件满足或超时
///
/// 超时是正常结果，返回 `false`；轮询过程中的会话错误视为“尚未满足”
pub async fn wait_for<D>(
    doc: &mut D,
    condition: &Condition,
    timeout: Duration,
    poll_interval: Duration,
) -> bool
where
    D: DocumentQuery + ?Sized,
{
    let deadline = Instant::now() + timeout;
    loop {
        match check(doc, condition).await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => debug!("条件检查失败，继续等待: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(poll_interval.min(deadline - now)).await;
    }
}
