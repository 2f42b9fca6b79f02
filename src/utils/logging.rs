/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::BatchResult;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按配置选择 `debug` 或 `info`。重复调用不会报错。
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, total: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - RUC 批量查询模式");
    info!("🌐 查询页面: {}", config.target_url);
    info!("📊 待查询: {} 个, 最大并发数: {}", total, config.max_concurrent_lookups);
    if !config.panels.is_empty() {
        info!("📂 附加面板: {}", config.panels.join(", "));
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(result: &BatchResult) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部查询完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", result.succeeded, result.total);
    info!("❌ 失败: {}", result.failed);
    info!("⏱️ 耗时: {:.2}s", result.elapsed.as_secs_f64());
    for failure in result.results.iter().filter_map(|r| r.failure()) {
        warn!(
            "   [RUC {}] {:?}: {}",
            failure.identifier,
            failure.reason,
            truncate_text(&failure.message, 80)
        );
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
