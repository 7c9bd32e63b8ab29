// Careform Library - Clinical Documentation Workflow Orchestration
// This exposes the core components for testing and integration

pub mod catalog;
pub mod config;
pub mod form;
pub mod machines;
pub mod persist;
pub mod runtime;
pub mod submit;
pub mod telemetry;

// Re-export key types for easy access
pub use catalog::{ReasonCatalog, ReasonTemplate, StaticReasonCatalog};
pub use config::{config, init_config, CareformConfig};
pub use form::{FormState, ReferralState, SessionState, Severity, SurveyState};
pub use machines::{
    FormCommand, FormSeed, Orchestrator, OrchestratorState, ReferralCommand, TransitionRecord,
};
pub use persist::{FilePersistence, PersistError, Persistence};
pub use runtime::{ActorHandle, ActorId, ActorKind, ChildState, FieldEvent, Notification};
pub use submit::{
    build_payload, ScriptedTransport, SimulatedTransport, SubmissionError, SubmissionPayload,
    SubmissionReceipt, SubmissionTransport,
};
pub use telemetry::init_telemetry;
