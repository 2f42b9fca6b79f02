pub mod lookup_ctx;
pub mod lookup_flow;
pub mod panel_flow;

pub use lookup_ctx::LookupCtx;
pub use lookup_flow::{LookupFlow, LookupState};
pub use panel_flow::{panel_spec, PanelExtractor, PanelFlow, PanelSpec, Transition, PANEL_SPECS};
