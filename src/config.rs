use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::PanelFlags;

/// 程序配置
///
/// 所有时间类字段都以秒或毫秒的整数保存，方便写进 TOML 和环境变量。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 查询页面 URL
    pub target_url: String,
    /// 直接提交表单时使用的 action 路径
    pub submit_action_path: String,
    /// 浏览器 User-Agent
    pub user_agent: String,
    /// 视口宽度
    pub viewport_width: u32,
    /// 视口高度
    pub viewport_height: u32,
    /// 是否以无头模式启动
    pub headless: bool,
    /// 自定义 Chromium 可执行文件路径
    pub chrome_executable: Option<String>,
    /// 单次远程调用的超时（秒）
    pub request_timeout_secs: u64,
    /// 等待结果页的时间（秒）
    pub result_wait_secs: u64,
    /// 等待面板按钮可点击的时间（秒）
    pub trigger_wait_secs: u64,
    /// 等待面板页面加载的时间（秒）
    pub panel_wait_secs: u64,
    /// 页面跳转后的稳定等待（毫秒）
    pub settle_millis: u64,
    /// 条件轮询间隔（毫秒）
    pub poll_interval_millis: u64,
    /// 同时进行的查询数量
    pub max_concurrent_lookups: usize,
    /// 单个 RUC 的整体超时（秒）
    pub per_item_timeout_secs: u64,
    /// 默认启用的附加面板
    pub panels: Vec<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url:
                "https://e-consultaruc.sunat.gob.pe/cl-ti-itmrconsruc/FrameCriterioBusquedaWeb.jsp"
                    .to_string(),
            submit_action_path: "/cl-ti-itmrconsruc/jcrS00Alias".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36".to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            headless: true,
            chrome_executable: None,
            request_timeout_secs: 30,
            result_wait_secs: 10,
            trigger_wait_secs: 10,
            panel_wait_secs: 10,
            settle_millis: 1000,
            poll_interval_millis: 250,
            max_concurrent_lookups: 3,
            per_item_timeout_secs: 120,
            panels: Vec::new(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 读取配置：先读 `RUC_LOOKUP_CONFIG` 指定的 TOML 文件（如有），再用环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("RUC_LOOKUP_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        base.with_env_overrides()
    }

    /// 只使用默认值 + 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            target_url: env_string("TARGET_URL").unwrap_or(self.target_url),
            submit_action_path: env_string("SUBMIT_ACTION_PATH")
                .unwrap_or(self.submit_action_path),
            user_agent: env_string("USER_AGENT").unwrap_or(self.user_agent),
            viewport_width: env_parse("VIEWPORT_WIDTH")?.unwrap_or(self.viewport_width),
            viewport_height: env_parse("VIEWPORT_HEIGHT")?.unwrap_or(self.viewport_height),
            headless: env_parse("HEADLESS")?.unwrap_or(self.headless),
            chrome_executable: env_string("CHROME_EXECUTABLE").or(self.chrome_executable),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS")?
                .unwrap_or(self.request_timeout_secs),
            result_wait_secs: env_parse("RESULT_WAIT_SECS")?.unwrap_or(self.result_wait_secs),
            trigger_wait_secs: env_parse("TRIGGER_WAIT_SECS")?.unwrap_or(self.trigger_wait_secs),
            panel_wait_secs: env_parse("PANEL_WAIT_SECS")?.unwrap_or(self.panel_wait_secs),
            settle_millis: env_parse("SETTLE_MILLIS")?.unwrap_or(self.settle_millis),
            poll_interval_millis: env_parse("POLL_INTERVAL_MILLIS")?
                .unwrap_or(self.poll_interval_millis),
            max_concurrent_lookups: env_parse("MAX_CONCURRENT_LOOKUPS")?
                .unwrap_or(self.max_concurrent_lookups),
            per_item_timeout_secs: env_parse("PER_ITEM_TIMEOUT_SECS")?
                .unwrap_or(self.per_item_timeout_secs),
            panels: env_string("PANELS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(self.panels),
            verbose_logging: env_parse("VERBOSE_LOGGING")?.unwrap_or(self.verbose_logging),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn result_wait(&self) -> Duration {
        Duration::from_secs(self.result_wait_secs)
    }

    pub fn trigger_wait(&self) -> Duration {
        Duration::from_secs(self.trigger_wait_secs)
    }

    pub fn panel_wait(&self) -> Duration {
        Duration::from_secs(self.panel_wait_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }

    pub fn per_item_timeout(&self) -> Duration {
        Duration::from_secs(self.per_item_timeout_secs)
    }

    /// 把配置中的面板名称解析为开关集合
    pub fn panel_flags(&self) -> Result<PanelFlags, ConfigError> {
        PanelFlags::from_names(self.panels.iter().map(String::as_str))
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(var_name: &str) -> Result<Option<T>, ConfigError> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
    }
}
