use std::time::Duration;

use thiserror::Error;

use crate::models::FailureReason;

/// RUC 格式校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 长度不是 11 位
    #[error("RUC 必须是 11 位数字 (实际长度: {len})")]
    WrongLength { len: usize },
    /// 含有非数字字符
    #[error("RUC 只能包含数字: {value}")]
    NonNumeric { value: String },
}

/// 会话驱动错误
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// 无法启动自动化运行时
    #[error("会话初始化失败: {0}")]
    Init(String),
    /// 页面导航失败
    #[error("导航到 {url} 失败: {message}")]
    Navigation { url: String, message: String },
    /// 执行脚本失败
    #[error("执行脚本失败: {0}")]
    Script(String),
    /// 页面元素交互失败
    #[error("元素交互失败 ({locator}): {message}")]
    Interaction { locator: String, message: String },
    /// 远程调用超时
    #[error("远程调用超时 ({0:?})")]
    Timeout(Duration),
    /// 会话已关闭
    #[error("会话已关闭")]
    Closed,
}

/// 单个 RUC 查询失败的原因
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    SessionInit(SessionError),
    #[error("{0}")]
    Navigation(SessionError),
    /// 等待结果页超时
    #[error("等待查询结果超时 ({waited:?})")]
    ResultTimeout { waited: Duration },
    /// 页面弹出了原生对话框
    #[error("查询被页面拒绝: {message}")]
    InterstitialRejected { message: String },
    /// 结果页没有基本信息
    #[error("未找到该 RUC 的数据")]
    NoRecord,
    /// 其他会话错误
    #[error("{0}")]
    Session(SessionError),
}

impl LookupError {
    /// 转换为失败记录中的原因标签
    pub fn reason(&self) -> FailureReason {
        match self {
            LookupError::Validation(_) => FailureReason::Validation,
            LookupError::SessionInit(_) => FailureReason::SessionInit,
            LookupError::Navigation(_) => FailureReason::Navigation,
            LookupError::ResultTimeout { .. } => FailureReason::ResultTimeout,
            LookupError::InterstitialRejected { .. } => FailureReason::InterstitialRejected,
            LookupError::NoRecord => FailureReason::NoRecord,
            LookupError::Session(_) => FailureReason::Session,
        }
    }
}

/// 附加面板提取错误（只会让该面板缺省，不影响整个查询）
#[derive(Debug, Clone, Error)]
pub enum PanelError {
    #[error("{0}")]
    Session(#[from] SessionError),
    /// 面板页弹出了原生对话框
    #[error("面板页弹出对话框: {0}")]
    Dialog(String),
    /// 触发后页面没有跳转，仍停在上一页
    #[error("面板页未在 {0:?} 内打开")]
    NotLoaded(Duration),
}

/// 批量调度的前置条件错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("并发数必须大于 0 (实际: {0})")]
    InvalidConcurrency(usize),
    #[error("单项超时必须大于 0")]
    InvalidTimeout,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 未知的面板名称
    #[error("未知的面板名称: {0}")]
    UnknownPanel(String),
}

impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SessionError::Script(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Script(format!("JSON解析失败: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_errors_map_to_failure_reasons() {
        assert_eq!(
            LookupError::ResultTimeout {
                waited: Duration::from_secs(10)
            }
            .reason(),
            FailureReason::ResultTimeout
        );
        assert_eq!(
            LookupError::InterstitialRejected {
                message: "RUC inválido".to_string()
            }
            .reason(),
            FailureReason::InterstitialRejected
        );
        assert_eq!(
            LookupError::from(ValidationError::WrongLength { len: 3 }).reason(),
            FailureReason::Validation
        );
    }

    #[test]
    fn validation_error_message_mentions_length() {
        let err = ValidationError::WrongLength { len: 9 };
        assert!(err.to_string().contains('9'));
    }
}
