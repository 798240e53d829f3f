use async_trait::async_trait;
use crate::errors::DocfreshError;
use super::hitl::HumanInputProvider;
use super::state::{AuditContext, StageName, StageOutput};

/// One step of the audit pipeline. Stages see the outputs of the stages
/// before them through `ctx` and may pause for reviewer feedback via `human`.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> StageName;

    async fn run(
        &self,
        ctx: &AuditContext,
        human: &dyn HumanInputProvider,
    ) -> Result<StageOutput, DocfreshError>;
}
