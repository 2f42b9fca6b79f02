//! 查询结果数据结构

use std::collections::BTreeMap;
use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::models::identifier::Ruc;
use crate::models::panel::PanelKind;

/// 表格中的一行：列名 → 单元格文本
pub type Row = BTreeMap<String, String>;

/// 当前时间，格式与查询记录一致
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 基本信息字段值
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::List(items) => Some(items),
        }
    }
}

/// 面板数据的可信度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    /// 由启发式规则推断，可能分类错误
    Low,
}

/// 历史信息面板：三类记录混排在数量不定的表格里
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryReport {
    #[serde(rename = "razon_social_anteriores")]
    pub name_history: Vec<Row>,
    #[serde(rename = "condicion_anteriores")]
    pub condition_history: Vec<Row>,
    #[serde(rename = "direccion_anteriores")]
    pub address_history: Vec<Row>,
    /// 至少有一张表是按启发式规则归类的
    #[serde(rename = "baja_confianza", skip_serializing_if = "std::ops::Not::not")]
    pub low_confidence: bool,
}

impl HistoryReport {
    pub fn total_entries(&self) -> usize {
        self.name_history.len() + self.condition_history.len() + self.address_history.len()
    }
}

/// 面板内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelData {
    /// 表格行
    Rows(Vec<Row>),
    /// 历史信息
    History(HistoryReport),
    /// 单条状态信息（纾困计划）
    Status(Row),
    /// 页面明确表示该项不适用
    NotApplicable { message: String },
}

impl Serialize for PanelData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PanelData::Rows(rows) => rows.serialize(serializer),
            PanelData::History(report) => report.serialize(serializer),
            PanelData::Status(row) => row.serialize(serializer),
            PanelData::NotApplicable { message } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("tiene_deuda", &false)?;
                map.serialize_entry("mensaje", message)?;
                map.end()
            }
        }
    }
}

/// 一个附加面板的提取结果，挂到记录后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelReport {
    kind: PanelKind,
    data: PanelData,
}

impl PanelReport {
    pub fn new(kind: PanelKind, data: PanelData) -> Self {
        Self { kind, data }
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    pub fn data(&self) -> &PanelData {
        &self.data
    }

    pub fn confidence(&self) -> Confidence {
        match &self.data {
            PanelData::History(report) if report.low_confidence => Confidence::Low,
            _ => Confidence::High,
        }
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match &self.data {
            PanelData::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

impl Serialize for PanelReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

/// 成功的查询记录
#[derive(Debug, Clone, Serialize)]
pub struct LookupRecord {
    #[serde(rename = "ruc")]
    identifier: Ruc,
    #[serde(rename = "fecha_consulta")]
    queried_at: String,
    success: bool,
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
    #[serde(flatten)]
    panels: BTreeMap<PanelKind, PanelReport>,
}

impl LookupRecord {
    pub fn new(identifier: Ruc, fields: BTreeMap<String, FieldValue>) -> Self {
        Self {
            identifier,
            queried_at: now_timestamp(),
            success: true,
            fields,
            panels: BTreeMap::new(),
        }
    }

    pub fn identifier(&self) -> &Ruc {
        &self.identifier
    }

    pub fn queried_at(&self) -> &str {
        &self.queried_at
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_text)
    }

    /// 法定名称，附加面板依赖它
    pub fn legal_name(&self) -> Option<&str> {
        self.text("razon_social").filter(|name| !name.is_empty())
    }

    pub fn panel(&self, kind: PanelKind) -> Option<&PanelReport> {
        self.panels.get(&kind)
    }

    pub fn panels(&self) -> impl Iterator<Item = &PanelReport> {
        self.panels.values()
    }

    pub(crate) fn attach_panel(&mut self, report: PanelReport) {
        self.panels.insert(report.kind(), report);
    }

    /// 除查询时间外完全相同
    pub fn same_data(&self, other: &LookupRecord) -> bool {
        self.identifier == other.identifier
            && self.fields == other.fields
            && self.panels == other.panels
    }
}

/// 失败原因标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "SessionInitError")]
    SessionInit,
    #[serde(rename = "NavigationError")]
    Navigation,
    ResultTimeout,
    InterstitialRejected,
    #[serde(rename = "NoRecord")]
    NoRecord,
    #[serde(rename = "SessionError")]
    Session,
    WorkerTimeout,
    WorkerCrashed,
}

/// 失败记录
#[derive(Debug, Clone, Serialize)]
pub struct LookupFailure {
    #[serde(rename = "ruc")]
    pub identifier: String,
    pub success: bool,
    #[serde(rename = "motivo")]
    pub reason: FailureReason,
    #[serde(rename = "error")]
    pub message: String,
    #[serde(rename = "fecha_consulta")]
    pub queried_at: String,
}

impl LookupFailure {
    pub fn new(identifier: impl Into<String>, reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            success: false,
            reason,
            message: message.into(),
            queried_at: now_timestamp(),
        }
    }
}

/// 单个 RUC 的最终结果
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LookupOutcome {
    Found(LookupRecord),
    Failed(LookupFailure),
}

impl LookupOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }

    /// 原始输入的标识符
    pub fn identifier(&self) -> &str {
        match self {
            LookupOutcome::Found(record) => record.identifier().as_str(),
            LookupOutcome::Failed(failure) => &failure.identifier,
        }
    }

    pub fn record(&self) -> Option<&LookupRecord> {
        match self {
            LookupOutcome::Found(record) => Some(record),
            LookupOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&LookupFailure> {
        match self {
            LookupOutcome::Found(_) => None,
            LookupOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// 一批查询的汇总报告，`results` 按完成顺序排列
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub total: usize,
    #[serde(rename = "exitosos")]
    pub succeeded: usize,
    #[serde(rename = "fallidos")]
    pub failed: usize,
    #[serde(rename = "tiempo_total_segundos", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    #[serde(rename = "resultados")]
    pub results: Vec<LookupOutcome>,
}

impl BatchResult {
    /// 由结果列表统计出总数
    pub fn from_outcomes(results: Vec<LookupOutcome>, elapsed: Duration) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            elapsed,
            results,
        }
    }
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value.as_secs_f64() * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> LookupRecord {
        let mut fields = BTreeMap::new();
        fields.insert(
            "razon_social".to_string(),
            FieldValue::Text("EMPRESA DEMO S.A.C.".to_string()),
        );
        fields.insert(
            "actividades_economicas".to_string(),
            FieldValue::List(vec!["Principal - 4711".to_string()]),
        );
        LookupRecord::new(Ruc::parse("20100070970").unwrap(), fields)
    }

    #[test]
    fn record_serializes_flat_with_panels() {
        let mut record = sample_record();
        record.attach_panel(PanelReport::new(
            PanelKind::CoerciveDebt,
            PanelData::NotApplicable {
                message: "No registra deuda".to_string(),
            },
        ));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["ruc"], json!("20100070970"));
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["razon_social"], json!("EMPRESA DEMO S.A.C."));
        assert_eq!(value["actividades_economicas"], json!(["Principal - 4711"]));
        assert_eq!(
            value["deuda_coactiva"],
            json!({"tiene_deuda": false, "mensaje": "No registra deuda"})
        );
        assert!(value.get("fecha_consulta").is_some());
    }

    #[test]
    fn low_confidence_history_is_tagged() {
        let report = PanelReport::new(
            PanelKind::History,
            PanelData::History(HistoryReport {
                low_confidence: true,
                ..Default::default()
            }),
        );
        assert_eq!(report.confidence(), Confidence::Low);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["baja_confianza"], json!(true));

        let confident = PanelReport::new(PanelKind::History, PanelData::History(HistoryReport::default()));
        assert_eq!(confident.confidence(), Confidence::High);
        assert!(serde_json::to_value(&confident).unwrap().get("baja_confianza").is_none());
    }

    #[test]
    fn same_data_ignores_timestamp() {
        let a = sample_record();
        let mut b = sample_record();
        b.queried_at = "2000-01-01 00:00:00".to_string();
        assert!(a.same_data(&b));
    }

    #[test]
    fn batch_result_counts_outcomes() {
        let outcomes = vec![
            LookupOutcome::Found(sample_record()),
            LookupOutcome::Failed(LookupFailure::new("123", FailureReason::Validation, "bad")),
        ];
        let result = BatchResult::from_outcomes(outcomes, Duration::from_millis(1500));
        assert_eq!(result.total, 2);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 1);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["tiempo_total_segundos"], json!(1.5));
        assert_eq!(value["resultados"][1]["motivo"], json!("ValidationError"));
    }
}
