use super::state::StageName;

pub struct StageDefinition {
    pub name: StageName,
    pub display_name: &'static str,
    pub description: &'static str,
}

pub static STAGES: &[StageDefinition] = &[
    StageDefinition {
        name: StageName::Audit,
        display_name: "Documentation Audit",
        description: "Walk the project and collect documentation evidence from every finding producer",
    },
    StageDefinition {
        name: StageName::Scoring,
        display_name: "Freshness Scoring",
        description: "Score each documented file against the scoring policy",
    },
    StageDefinition {
        name: StageName::Suggestion,
        display_name: "Fix Suggestions",
        description: "Render the report draft, collect reviewer feedback and finalize suggested fixes",
    },
];

pub fn display_name(stage: StageName) -> &'static str {
    STAGES
        .iter()
        .find(|s| s.name == stage)
        .map(|s| s.display_name)
        .unwrap_or("Unknown")
}
