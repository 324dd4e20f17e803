use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifier of a step within one workflow.
pub type StepId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branches {
    pub yes: StepId,
    pub no: StepId,
}

/// One node of the workflow graph.
///
/// Serialized with a `type` discriminant. Steps written before decisions
/// existed carry no `type` at all; those read back as actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStep", into = "RawStep")]
pub enum Step {
    Action {
        id: StepId,
        text: String,
        approval: bool,
        next: Option<StepId>,
    },
    Decision {
        id: StepId,
        text: String,
        approval: bool,
        branches: Option<Branches>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Action,
    Decision,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Action => "action",
            StepKind::Decision => "decision",
        }
    }
}

impl Step {
    pub fn action(id: StepId, text: impl Into<String>, next: Option<StepId>) -> Self {
        Step::Action {
            id,
            text: text.into(),
            approval: false,
            next,
        }
    }

    pub fn decision(id: StepId, text: impl Into<String>, yes: StepId, no: StepId) -> Self {
        Step::Decision {
            id,
            text: text.into(),
            approval: false,
            branches: Some(Branches { yes, no }),
        }
    }

    pub fn id(&self) -> StepId {
        match self {
            Step::Action { id, .. } | Step::Decision { id, .. } => *id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Step::Action { text, .. } | Step::Decision { text, .. } => text,
        }
    }

    pub fn kind(&self) -> StepKind {
        match self {
            Step::Action { .. } => StepKind::Action,
            Step::Decision { .. } => StepKind::Decision,
        }
    }

    pub fn needs_approval(&self) -> bool {
        match self {
            Step::Action { approval, .. } | Step::Decision { approval, .. } => *approval,
        }
    }

    /// Ids this step hands control to.
    pub fn targets(&self) -> Vec<StepId> {
        match self {
            Step::Action { next, .. } => next.iter().copied().collect(),
            Step::Decision { branches, .. } => branches
                .map(|b| vec![b.yes, b.no])
                .unwrap_or_default(),
        }
    }
}

/// Lenient wire shape shared by every schema generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawStep {
    id: StepId,
    #[serde(default)]
    text: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default)]
    approval: bool,
    #[serde(default)]
    next: Option<StepId>,
    #[serde(default)]
    branches: Option<Branches>,
}

impl From<RawStep> for Step {
    fn from(raw: RawStep) -> Self {
        let is_decision = raw
            .kind
            .as_deref()
            .is_some_and(|k| k.trim().eq_ignore_ascii_case("decision"));
        if is_decision {
            Step::Decision {
                id: raw.id,
                text: raw.text,
                approval: raw.approval,
                branches: raw.branches,
            }
        } else {
            Step::Action {
                id: raw.id,
                text: raw.text,
                approval: raw.approval,
                next: raw.next,
            }
        }
    }
}

impl From<Step> for RawStep {
    fn from(step: Step) -> Self {
        let kind = Some(step.kind().as_str().to_string());
        match step {
            Step::Action {
                id,
                text,
                approval,
                next,
            } => RawStep {
                id,
                text,
                kind,
                approval,
                next,
                branches: None,
            },
            Step::Decision {
                id,
                text,
                approval,
                branches,
            } => RawStep {
                id,
                text,
                kind,
                approval,
                next: None,
                branches,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn find_step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: StepId) -> bool {
        self.find_step(id).is_some()
    }

    pub fn step_ids(&self) -> HashSet<StepId> {
        self.steps.iter().map(Step::id).collect()
    }

    /// Whether any step hands control to `id`.
    pub fn references(&self, id: StepId) -> bool {
        self.steps.iter().any(|s| s.targets().contains(&id))
    }
}
