//! 提取层
//!
//! 只读取文档，不导航、不点击。字段缺失返回 `None`，会话出错返回 `Err`。

pub mod core_record;
pub mod history;
pub mod status;
pub mod table;

pub use core_record::{core_field_resolver, extract_core_record};
pub use history::{classify_historical_table, extract_history, HistoryTableKind};
pub use status::{extract_relief_status, ReliefKeys, COVID19_KEYS, REACTIVA_KEYS};
pub use table::{extract_table, rows_from_table, table_cascade, Column, ColumnSpec};
