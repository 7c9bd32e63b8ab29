// Form actor machines, leaves first: sessions, survey, referrals, and the
// root orchestrator that owns them.

pub mod orchestrator;
pub mod referral;
pub mod referrals;
pub mod session;
pub mod survey;

pub use orchestrator::{FormCommand, FormSeed, Orchestrator, OrchestratorState, TransitionRecord};
pub use referral::ReferralActor;
pub use referrals::{ReferralCollection, ReferralCommand};
pub use session::SessionActor;
pub use survey::SurveyActor;
