use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::Config;
use crate::events::{EventSink, TracingSink};
use crate::models::{BatchResult, LookupOutcome};
use crate::orchestrator::{BatchOptions, LookupRunner};
use crate::session::{ChromeSessionFactory, SessionFactory};
use crate::utils::logging::{log_startup, print_final_stats};
use crate::workflow::LookupFlow;

/// 应用主结构
///
/// 把配置、Chromium 会话工厂和查询器连在一起
pub struct App {
    config: Arc<Config>,
    runner: LookupRunner,
    options: BatchOptions,
}

impl App {
    /// 使用 Chromium 会话初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let factory = Arc::new(ChromeSessionFactory::new(Arc::clone(&config)));
        Self::with_factory(config, factory, Arc::new(TracingSink))
    }

    /// 使用自定义会话工厂和事件接收器初始化
    pub fn with_factory(
        config: Arc<Config>,
        factory: Arc<dyn SessionFactory>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let options = BatchOptions::from_config(&config).context("解析面板配置失败")?;
        let flow = LookupFlow::new(&config, events);
        Ok(Self {
            config,
            runner: LookupRunner::new(factory, flow),
            options,
        })
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// 查询单个 RUC
    pub async fn lookup(&self, identifier: &str) -> LookupOutcome {
        self.runner.lookup_one(identifier, &self.options.panels).await
    }

    /// 运行批量查询
    pub async fn run(&self, identifiers: &[String]) -> Result<BatchResult> {
        if identifiers.is_empty() {
            warn!("⚠️ 没有待查询的 RUC，程序结束");
        }
        log_startup(&self.config, identifiers.len());

        let result = self
            .runner
            .run_batch(identifiers, &self.options)
            .await
            .context("批量查询参数不合法")?;

        print_final_stats(&result);
        Ok(result)
    }
}
