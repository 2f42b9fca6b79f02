//! 历史信息面板
//!
//! 历史信息页由数量不定的表格组成，每张表可能是历史名称、历史地址或历史状态。
//! 表头明确时直接归类；只有两列且表头不明确时按行启发式判断，结果标记为低可信度。

use tracing::debug;

use crate::error::SessionError;
use crate::extraction::table::{find_tables, normalize_whitespace, ColumnSpec};
use crate::locator::Locator;
use crate::models::{HistoryReport, Row};
use crate::session::{DocumentQuery, TableSnapshot};

/// 短于此长度的单元格视为名称而不是地址
const NAME_MAX_CHARS: usize = 150;

const ANY_TABLE: ColumnSpec = ColumnSpec::new(&[]);

/// 历史表格的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryTableKind {
    NameHistory,
    AddressHistory,
    ConditionHistory,
    /// 两列表格，表头不足以判断
    GenericTwoColumn,
    Unrecognized,
}

/// 按表头归类
pub fn classify_historical_table(headers: &[String]) -> HistoryTableKind {
    let joined = headers.join(" ");
    if joined.contains("Nombre") || joined.contains("Razón Social") {
        HistoryTableKind::NameHistory
    } else if joined.contains("Direcci") || joined.contains("Domicilio") {
        HistoryTableKind::AddressHistory
    } else if headers.len() == 3 && (joined.contains("Condici") || joined.contains("Fecha Desde"))
    {
        HistoryTableKind::ConditionHistory
    } else if headers.len() == 2 {
        HistoryTableKind::GenericTwoColumn
    } else {
        HistoryTableKind::Unrecognized
    }
}

fn cell(cells: &[String], idx: usize) -> String {
    cells.get(idx).map(|c| normalize_whitespace(c)).unwrap_or_default()
}

fn dated_row(key: &str, cells: &[String]) -> Option<Row> {
    let value = cell(cells, 0);
    if cells.len() < 2 || value.is_empty() {
        return None;
    }
    let mut row = Row::new();
    row.insert(key.to_string(), value);
    row.insert("fecha_baja".to_string(), cell(cells, 1));
    Some(row)
}

fn condition_row(cells: &[String]) -> Option<Row> {
    let condition = cell(cells, 0);
    if cells.len() < 3 || condition.is_empty() {
        return None;
    }
    let mut row = Row::new();
    row.insert("condicion".to_string(), condition);
    row.insert("fecha_desde".to_string(), cell(cells, 1));
    row.insert("fecha_hasta".to_string(), cell(cells, 2));
    Some(row)
}

/// 两列表格的逐行判断
fn generic_row_is_name(first_header: &str, table_idx: usize, value: &str) -> bool {
    let header = first_header.to_lowercase();
    if header.contains("direcci") || header.contains("domicilio") {
        return false;
    }
    table_idx == 0
        || header.contains("nombre")
        || header.contains("raz")
        || value.chars().count() < NAME_MAX_CHARS
}

/// 把一张表的内容并入报告
pub fn merge_history_table(report: &mut HistoryReport, table_idx: usize, table: &TableSnapshot) {
    let kind = classify_historical_table(&table.headers);
    debug!("历史表格 {} 归类为 {:?}", table_idx + 1, kind);

    for cells in &table.rows {
        match kind {
            HistoryTableKind::NameHistory => {
                report
                    .name_history
                    .extend(dated_row("razon_social", cells));
            }
            HistoryTableKind::AddressHistory => {
                report
                    .address_history
                    .extend(dated_row("direccion", cells));
            }
            HistoryTableKind::ConditionHistory => {
                report.condition_history.extend(condition_row(cells));
            }
            HistoryTableKind::GenericTwoColumn => {
                let first_header = table.headers.first().map(String::as_str).unwrap_or("");
                let value = cell(cells, 0);
                if generic_row_is_name(first_header, table_idx, &value) {
                    if let Some(row) = dated_row("razon_social", cells) {
                        report.name_history.push(row);
                        report.low_confidence = true;
                    }
                } else if let Some(row) = dated_row("direccion", cells) {
                    report.address_history.push(row);
                    report.low_confidence = true;
                }
            }
            HistoryTableKind::Unrecognized => {}
        }
    }
}

/// 提取历史信息；没有任何记录时返回 `None`
pub async fn extract_history<D>(
    doc: &mut D,
    cascade: &[Locator],
) -> Result<Option<HistoryReport>, SessionError>
where
    D: DocumentQuery + ?Sized,
{
    let Some(tables) = find_tables(doc, cascade, &ANY_TABLE).await? else {
        return Ok(None);
    };

    let mut report = HistoryReport::default();
    for (idx, table) in tables.iter().enumerate() {
        merge_history_table(&mut report, idx, table);
    }

    Ok((report.total_entries() > 0).then_some(report))
}
