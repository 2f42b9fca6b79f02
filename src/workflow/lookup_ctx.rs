//! 查询上下文
//!
//! 封装"我正在查询批次中的第几个 RUC"这一信息

use std::fmt::Display;

use crate::models::Ruc;

/// 单个 RUC 的查询上下文
#[derive(Debug, Clone)]
pub struct LookupCtx {
    pub ruc: Ruc,

    /// 在批次中的位置（从1开始，仅用于日志显示）
    pub position: usize,

    /// 批次大小
    pub batch_size: usize,
}

impl LookupCtx {
    pub fn new(ruc: Ruc, position: usize, batch_size: usize) -> Self {
        Self {
            ruc,
            position,
            batch_size,
        }
    }

    /// 单独查询
    pub fn single(ruc: Ruc) -> Self {
        Self::new(ruc, 1, 1)
    }
}

impl Display for LookupCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.batch_size > 1 {
            write!(f, "[RUC {} {}/{}]", self.ruc, self.position, self.batch_size)
        } else {
            write!(f, "[RUC {}]", self.ruc)
        }
    }
}
