// Typed domain state for the clinical form: per-child state records and the
// aggregate owned by the orchestrator.

pub mod fields;
mod referral;
mod session;
mod state;
mod survey;

pub use referral::ReferralState;
pub use session::SessionState;
pub use state::FormState;
pub use survey::{Severity, SurveyState};
