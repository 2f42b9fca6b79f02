//! 会话驱动层
//!
//! 一个会话就是一个独立的浏览器上下文（独立进程、独立用户目录），
//! 只服务于一次 RUC 查询。
//!
//! - `DocumentQuery` - 只读的文档查询能力
//! - `Session` - 在查询能力之上增加导航、提交、点击和生命周期
//! - `SessionFactory` - 为每个 worker 打开新会话
//! - `SessionLease` - 作用域内持有会话，任何退出路径都会释放

pub mod chrome;
pub mod document;
mod lease;
pub mod scripts;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

use crate::error::SessionError;
use crate::locator::Locator;

pub use chrome::{ChromeSession, ChromeSessionFactory};
pub use document::{check, wait_for, Condition, DocumentQuery, ElementState, TableSnapshot};
pub use lease::SessionLease;

/// 一个远程交互会话
///
/// 会话只被一个查询独占，不会被并发访问
#[async_trait]
pub trait Session: DocumentQuery {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// 填写查询框并点击提交按钮
    async fn submit_form(
        &mut self,
        field_id: &str,
        value: &str,
        submit_id: &str,
    ) -> Result<(), SessionError>;

    async fn click(&mut self, locator: &Locator) -> Result<(), SessionError>;

    /// 注入并提交一个隐藏表单
    async fn direct_submit(
        &mut self,
        action_path: &str,
        fields: &[(String, String)],
    ) -> Result<(), SessionError>;

    /// 在当前文档上留下标记，文档被替换后标记随之消失
    async fn mark_page(&mut self) -> Result<(), SessionError>;

    /// 关闭当前的原生对话框，返回其文本
    async fn dismiss_dialog(&mut self) -> Result<Option<String>, SessionError>;

    /// 释放全部资源，可重复调用
    async fn close(&mut self) -> Result<(), SessionError>;

    /// 同步强制释放，用于 drop 和超时取消
    fn force_release(&mut self);
}

/// 会话工厂
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Session>, SessionError>;
}
