use std::io::{self, BufRead};

use anyhow::{Context, Result};
use ruc_lookup::utils::init_tracing;
use ruc_lookup::{App, Config};

/// 从命令行参数读取 RUC；没有参数时从标准输入逐行读取
fn read_identifiers() -> Result<Vec<String>> {
    let args: Vec<String> = std::env::args()
        .skip(1)
        .map(|arg| arg.trim().to_string())
        .collect();
    if !args.is_empty() {
        return Ok(args);
    }

    let mut identifiers = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("读取标准输入失败")?;
        let line = line.trim();
        if !line.is_empty() {
            identifiers.push(line.to_string());
        }
    }
    Ok(identifiers)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load().context("加载配置失败")?;

    // 初始化日志
    init_tracing(config.verbose_logging);

    let identifiers = read_identifiers()?;

    // 初始化并运行应用
    let app = App::initialize(config)?;
    let result = app.run(&identifiers).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("序列化结果失败")?
    );
    Ok(())
}
