//! Risk management module
//!
//! Exposure aggregation, trade admission, the pre-trade checklist and
//! position sizing

mod checklist;
mod exposure;
mod gate;
mod kelly;
mod types;

pub use checklist::{run_checklist, Advisory, ChecklistInput, Severity};
pub use exposure::{ExposureSnapshot, ExposureSummary, LimitStatus, NarrativeExposure};
pub use gate::RiskGate;
pub use kelly::{kelly_size, odds_from_price, KellyCalculator};
pub use types::{AsymmetricRisk, ProposedTrade, RiskDecision, RiskMessage, RiskViolation};
