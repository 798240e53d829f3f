//! Audit pipeline coordination: stages, the human-in-the-loop wait protocol
//! and the coordinator that drives one worker task per report.

pub mod coordinator;
pub mod events;
pub mod hitl;
pub mod outputs;
pub mod phase;
pub mod stage;
pub mod stages;
pub mod state;

pub use coordinator::PipelineCoordinator;
pub use events::PipelineEvent;
pub use hitl::{AutoApprove, HumanInputProvider, PresetInput, StatusSink, TerminalInputProvider, WaitSlotInputProvider, WaitSlotRegistry};
pub use stage::Stage;
pub use stages::{default_stages, AuditStage, ScoringStage, SuggestionStage};
pub use state::{AuditContext, FeedbackAck, PipelineConfig, StageName, StageOutput, StartResponse, StatusResponse};
