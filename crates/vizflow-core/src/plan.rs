use crate::{Step, StepId, Workflow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Characters of the model's reply echoed back when extraction fails.
pub const RAW_PREVIEW_CHARS: usize = 500;

/// Inbound body of `POST /plan`.
///
/// `current_workflow` is kept exactly as the client sent it: it is echoed to
/// the model untouched, and only read through the typed model for linting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub task: String,
    #[serde(default)]
    pub current_workflow: Option<Map<String, Value>>,
    #[serde(default)]
    pub anchor_step_id: Option<StepId>,
}

impl PlanRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            ..Default::default()
        }
    }

    pub fn with_workflow(mut self, workflow: Map<String, Value>) -> Self {
        self.current_workflow = Some(workflow);
        self
    }

    pub fn with_anchor(mut self, anchor: StepId) -> Self {
        self.anchor_step_id = Some(anchor);
        self
    }

    /// The client's workflow as sent, or `{"steps": []}` when it sent none
    /// (or an empty object).
    pub fn raw_workflow(&self) -> Map<String, Value> {
        match &self.current_workflow {
            Some(wf) if !wf.is_empty() => wf.clone(),
            _ => {
                let mut empty = Map::new();
                empty.insert("steps".to_string(), Value::Array(Vec::new()));
                empty
            }
        }
    }

    fn raw_steps(&self) -> &[Value] {
        self.current_workflow
            .as_ref()
            .and_then(|wf| wf.get("steps"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Typed view of the client's workflow. Steps that do not fit the step
    /// schema are left out.
    pub fn workflow(&self) -> Workflow {
        Workflow::new(
            self.raw_steps()
                .iter()
                .filter_map(|step| Step::deserialize(step).ok())
                .collect(),
        )
    }

    /// Number of steps the client sent, typed or not.
    pub fn existing_step_count(&self) -> usize {
        self.raw_steps().len()
    }

    /// True when the request asks to extend an existing graph.
    pub fn is_edit(&self) -> bool {
        self.anchor_step_id.is_some() || self.existing_step_count() > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    AiUnreachable,
    AiFailed,
    JsonError,
    /// Accepted on the wire; the planner reports missing `steps` as
    /// `JsonError`.
    InvalidSchema,
}

/// Structured failure returned in place of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: ErrorCode,
    pub details: String,
    pub steps: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_preview: Option<String>,
}

impl ErrorResult {
    pub fn new(error: ErrorCode, details: impl Into<String>) -> Self {
        Self {
            error,
            details: details.into(),
            steps: Vec::new(),
            raw_preview: None,
        }
    }

    pub fn with_raw_preview(mut self, raw: &str) -> Self {
        self.raw_preview = Some(raw.chars().take(RAW_PREVIEW_CHARS).collect());
        self
    }
}

/// Outbound body of `POST /plan`: the model's `{ "steps": [...] }` object as
/// extracted, or an [`ErrorResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanResponse {
    Error(ErrorResult),
    Plan(Map<String, Value>),
}

impl PlanResponse {
    pub fn error(&self) -> Option<&ErrorResult> {
        match self {
            PlanResponse::Error(e) => Some(e),
            PlanResponse::Plan(_) => None,
        }
    }

    pub fn plan(&self) -> Option<&Map<String, Value>> {
        match self {
            PlanResponse::Plan(p) => Some(p),
            PlanResponse::Error(_) => None,
        }
    }
}

impl From<ErrorResult> for PlanResponse {
    fn from(e: ErrorResult) -> Self {
        PlanResponse::Error(e)
    }
}
