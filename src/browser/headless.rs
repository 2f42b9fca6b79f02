use std::path::{Path, PathBuf};

use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::SessionError;

/// 启动一个独立的无头浏览器进程
///
/// 每次调用都使用单独的用户目录，cookie 和缓存互不共享。
/// 返回浏览器句柄和后台事件处理任务，调用方负责在关闭时 abort 该任务。
pub async fn launch_isolated_browser(
    config: &Config,
    profile_dir: &Path,
) -> Result<(Browser, JoinHandle<()>), SessionError> {
    debug!("🚀 启动无头浏览器, 用户目录: {}", profile_dir.display());

    let mut builder = BrowserConfig::builder()
        .user_data_dir(profile_dir)
        .window_size(config.viewport_width, config.viewport_height)
        .viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            ..Default::default()
        })
        .request_timeout(config.request_timeout())
        .args(vec![
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-software-rasterizer".to_string(),
            "--disable-extensions".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--user-agent={}", config.user_agent),
        ]);

    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(executable) = &config.chrome_executable {
        builder = builder.chrome_executable(PathBuf::from(executable));
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        SessionError::Init(format!("配置无头浏览器失败: {}", e))
    })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        SessionError::Init(format!("启动无头浏览器失败: {}", e))
    })?;

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    info!("✅ 无头浏览器已启动");
    Ok((browser, handler_task))
}
