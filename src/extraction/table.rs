//! 表格提取
//!
//! 面板页上的表格结构不固定，按级联顺序查找：
//! 面板容器内的表格 → 带 `table` class 的表格 → `table-responsive` 容器 → 任意表格。

use tracing::debug;

use crate::error::SessionError;
use crate::locator::Locator;
use crate::models::Row;
use crate::session::{DocumentQuery, TableSnapshot};

/// 一列的定义：按位置取单元格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    /// 为空时整行丢弃
    pub required: bool,
    /// 数值列，去掉所有空白
    pub numeric: bool,
}

impl Column {
    pub const fn text(key: &'static str) -> Self {
        Self {
            key,
            required: false,
            numeric: false,
        }
    }

    pub const fn required(key: &'static str) -> Self {
        Self {
            key,
            required: true,
            numeric: false,
        }
    }

    pub const fn numeric(key: &'static str) -> Self {
        Self {
            key,
            required: false,
            numeric: true,
        }
    }
}

/// 表格的列定义以及表格本身的筛选条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub columns: &'static [Column],
    /// 表头数量下限
    pub min_headers: usize,
    /// 某个表头必须包含的文字
    pub header_marker: Option<&'static str>,
}

impl ColumnSpec {
    pub const fn new(columns: &'static [Column]) -> Self {
        Self {
            columns,
            min_headers: 0,
            header_marker: None,
        }
    }

    pub const fn with_header_marker(mut self, min_headers: usize, marker: &'static str) -> Self {
        self.min_headers = min_headers;
        self.header_marker = Some(marker);
        self
    }

    /// 表格是否符合筛选条件
    pub fn accepts(&self, table: &TableSnapshot) -> bool {
        if table.headers.len() < self.min_headers {
            return false;
        }
        match self.header_marker {
            Some(marker) => table.headers.iter().any(|h| h.contains(marker)),
            None => true,
        }
    }
}

/// 标准的表格查找级联
pub fn table_cascade() -> Vec<Locator> {
    vec![
        Locator::css("div.panel-primary table.table"),
        Locator::xpath("//table[@class='table']"),
        Locator::css("div.table-responsive table"),
        Locator::css("table"),
    ]
}

/// 合并连续空白
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_cell(text: &str, column: &Column) -> String {
    if column.numeric {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    } else {
        normalize_whitespace(text)
    }
}

/// 按列定义把表格行转换为记录
///
/// 单元格数少于列数或必填列为空的行被跳过
pub fn rows_from_table(table: &TableSnapshot, spec: &ColumnSpec) -> Vec<Row> {
    table
        .rows
        .iter()
        .filter(|cells| cells.len() >= spec.columns.len())
        .filter_map(|cells| {
            let mut row = Row::new();
            for (column, cell) in spec.columns.iter().zip(cells) {
                let value = normalize_cell(cell, column);
                if column.required && value.is_empty() {
                    return None;
                }
                row.insert(column.key.to_string(), value);
            }
            Some(row)
        })
        .collect()
}

/// 按级联查找表格，返回第一个命中策略下所有符合条件的表格
pub async fn find_tables<D>(
    doc: &mut D,
    cascade: &[Locator],
    spec: &ColumnSpec,
) -> Result<Option<Vec<TableSnapshot>>, SessionError>
where
    D: DocumentQuery + ?Sized,
{
    for locator in cascade {
        let tables: Vec<TableSnapshot> = doc
            .query_tables(locator)
            .await?
            .into_iter()
            .filter(|table| spec.accepts(table))
            .collect();
        if !tables.is_empty() {
            debug!("表格定位命中: {} ({} 张)", locator, tables.len());
            return Ok(Some(tables));
        }
    }
    Ok(None)
}

/// 提取表格数据
///
/// - `None`: 没有任何策略找到表格
/// - `Some(vec![])`: 找到了表格但没有合格的行
pub async fn extract_table<D>(
    doc: &mut D,
    cascade: &[Locator],
    spec: &ColumnSpec,
) -> Result<Option<Vec<Row>>, SessionError>
where
    D: DocumentQuery + ?Sized,
{
    let Some(tables) = find_tables(doc, cascade, spec).await? else {
        return Ok(None);
    };
    Ok(Some(
        tables
            .iter()
            .flat_map(|table| rows_from_table(table, spec))
            .collect(),
    ))
}
