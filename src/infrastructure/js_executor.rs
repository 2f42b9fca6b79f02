//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use std::time::Duration;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::timeout;

use crate::error::SessionError;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力，每次调用都有超时上限
/// - 不认识 RUC / 面板
pub struct JsExecutor {
    page: Page,
    call_timeout: Duration,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page, call_timeout: Duration) -> Self {
        Self { page, call_timeout }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// 页面上有原生对话框时 evaluate 会一直挂起，超时后返回 `SessionError::Timeout`
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, SessionError> {
        let result = timeout(self.call_timeout, self.page.evaluate(js_code.into()))
            .await
            .map_err(|_| SessionError::Timeout(self.call_timeout))??;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, SessionError> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}
