pub mod identifier;
pub mod panel;
pub mod record;

pub use identifier::{Ruc, RUC_LEN};
pub use panel::{PanelFlags, PanelKind};
pub use record::{
    now_timestamp, BatchResult, Confidence, FailureReason, FieldValue, HistoryReport,
    LookupFailure, LookupOutcome, LookupRecord, PanelData, PanelReport, Row,
};
