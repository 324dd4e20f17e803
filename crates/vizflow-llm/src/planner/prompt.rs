use super::{PlannerSettings, PromptStyle};
use crate::{ChatRequest, Message};
use vizflow_core::PlanRequest;

const STEPS_PROMPT: &str = r#"You are an AI that breaks a task down into a short, ordered workflow.

RULES:
- Output ONLY valid JSON
- NO markdown, NO commentary
- Step IDs are consecutive integers starting at 1
- Mark "approval": true on steps that need a human sign-off

FORMAT:
{
  "steps": [
    {
      "id": number,
      "text": "string",
      "approval": boolean
    }
  ]
}"#;

const BRANCHING_PROMPT: &str = r#"You are an AI that turns a task into a workflow graph.

ALLOWED:
- Sequential actions
- Decisions (if / else) with a "yes" and a "no" branch
- Loops (a branch or "next" pointing back to an earlier step)

RULES:
- Output ONLY valid JSON
- NO markdown, NO commentary
- Step IDs must be unique integers
- Action steps use "next" (or null for the last step) and "branches": null
- Decision steps use "branches" and "next": null
- Every "next" and branch target must be the id of a step you output

FORMAT:
{
  "steps": [
    {
      "id": number,
      "text": "string",
      "type": "action | decision",
      "approval": boolean,
      "next": number | null,
      "branches": { "yes": number, "no": number } | null
    }
  ]
}"#;

const GRAPH_EDIT_PROMPT: &str = r#"You are an AI that EDITS an existing workflow graph.

THE EXISTING WORKFLOW IS READ-ONLY.
You MUST NOT modify, delete, or repeat existing steps.

YOUR JOB:
- Add NEW steps only
- Attach them intentionally to the existing graph

ANCHOR RULES:
- If an anchor step ID is provided:
  - New steps MUST connect to that step
  - Use it as the entry point for new logic
  - Loops must originate from or return to the anchor
- Do NOT create free-floating subgraphs

ALLOWED:
- Sequential actions
- Decisions (if / else)
- Loops (branching back to existing steps)

RULES:
- Output ONLY valid JSON
- NO markdown, NO commentary
- New step IDs must be integers (temporary IDs are fine)
- Existing step IDs must be referenced exactly

FORMAT:
{
  "steps": [
    {
      "id": number,
      "text": "string",
      "type": "action | decision",
      "approval": boolean,
      "next": number | null,
      "branches": { "yes": number, "no": number } | null
    }
  ]
}"#;

pub(crate) fn system_prompt(style: PromptStyle) -> &'static str {
    match style {
        PromptStyle::Steps => STEPS_PROMPT,
        PromptStyle::Branching => BRANCHING_PROMPT,
        PromptStyle::GraphEdit => GRAPH_EDIT_PROMPT,
    }
}

/// Style actually used for `request`. Extending a graph always needs the
/// edit instructions, whatever is configured.
pub(crate) fn effective_style(request: &PlanRequest, configured: PromptStyle) -> PromptStyle {
    if request.is_edit() {
        PromptStyle::GraphEdit
    } else {
        configured
    }
}

pub(crate) fn anchor_directive(anchor: Option<i64>) -> String {
    match anchor {
        Some(id) => format!("Anchor step ID: {}", id),
        None => "No anchor step provided.".to_string(),
    }
}

pub(crate) fn user_message(request: &PlanRequest, style: PromptStyle) -> String {
    match style {
        PromptStyle::Steps | PromptStyle::Branching => request.task.clone(),
        PromptStyle::GraphEdit => {
            let workflow = serde_json::to_string_pretty(&request.raw_workflow()).unwrap_or_default();
            format!(
                "User request:\n{}\n\n{}\n\nCurrent workflow (READ ONLY):\n{}\n",
                request.task,
                anchor_directive(request.anchor_step_id),
                workflow
            )
        }
    }
}

/// Build the chat-completion payload for a plan request.
pub fn compose_chat_request(request: &PlanRequest, settings: &PlannerSettings) -> ChatRequest {
    let style = effective_style(request, settings.style);

    ChatRequest {
        model: settings.model.clone(),
        temperature: Some(settings.temperature.unwrap_or(style.default_temperature())),
        max_tokens: Some(settings.max_tokens.unwrap_or(style.default_max_tokens())),
        messages: vec![
            Message::system(system_prompt(style)),
            Message::user(user_message(request, style)),
        ],
    }
}
