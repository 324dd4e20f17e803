mod extract;
mod plan;
mod prompt;


pub use extract::{ExtractError, extract_plan};
pub use plan::plan_workflow;
pub use prompt::compose_chat_request;

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-14B-Instruct";

/// Which system prompt the planner sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// Flat ordered list of steps, no branching.
    Steps,
    /// Action and decision steps linked by `next` / `branches`.
    Branching,
    /// Extend an existing, read-only graph from an anchor step.
    #[default]
    GraphEdit,
}

impl PromptStyle {
    pub fn default_temperature(&self) -> f32 {
        match self {
            PromptStyle::Steps | PromptStyle::Branching => 0.3,
            PromptStyle::GraphEdit => 0.25,
        }
    }

    pub fn default_max_tokens(&self) -> u32 {
        match self {
            PromptStyle::Steps => 400,
            PromptStyle::Branching => 500,
            PromptStyle::GraphEdit => 600,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptStyle::Steps => "steps",
            PromptStyle::Branching => "branching",
            PromptStyle::GraphEdit => "graph-edit",
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "steps" => Ok(PromptStyle::Steps),
            "branching" => Ok(PromptStyle::Branching),
            "graph-edit" => Ok(PromptStyle::GraphEdit),
            other => Err(format!(
                "unknown prompt style '{}' (expected steps, branching or graph-edit)",
                other
            )),
        }
    }
}

/// Model-side knobs for composing a plan request.
#[derive(Debug, Clone)]
pub struct PlannerSettings {
    pub style: PromptStyle,
    pub model: String,
    /// Overrides the style's default when set.
    pub temperature: Option<f32>,
    /// Overrides the style's default when set.
    pub max_tokens: Option<u32>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            style: PromptStyle::default(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}
