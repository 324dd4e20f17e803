use super::PlannerSettings;
use super::extract::{ExtractError, extract_plan};
use super::prompt::compose_chat_request;
use crate::{ChatBackend, LlmError};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use vizflow_core::{ErrorCode, ErrorResult, PlanRequest, PlanResponse, Workflow, lint_plan};

/// Plan (or extend) a workflow for `request`.
///
/// Every failure is folded into an [`ErrorResult`], so callers always get a
/// body they can hand to the client.
pub async fn plan_workflow(
    backend: &impl ChatBackend,
    request: &PlanRequest,
    settings: &PlannerSettings,
) -> PlanResponse {
    let chat_request = compose_chat_request(request, settings);

    info!(
        anchor = ?request.anchor_step_id,
        existing_steps = request.existing_step_count(),
        "Planning workflow for task: {}",
        request.task
    );
    debug!(
        "Planner prompt lengths: system={} chars, user={} chars",
        chat_request.messages[0].text_content().map_or(0, str::len),
        chat_request.messages[1].text_content().map_or(0, str::len)
    );

    let response = match backend.chat(&chat_request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(status = ?e.status(), "Planner LLM call failed: {}", e);
            return llm_error_result(e).into();
        }
    };

    let Some(content) = response.first_text() else {
        warn!("Planner response had no text content");
        return ErrorResult::new(ErrorCode::JsonError, "AI response contained no text content")
            .into();
    };

    debug!("Planner raw output: {}", content);

    match extract_plan(content) {
        Ok(plan) => {
            log_plan_warnings(&plan, request);
            PlanResponse::Plan(plan)
        }
        Err(e) => {
            warn!("Failed to extract plan JSON: {}", e);
            ErrorResult::new(extract_error_code(&e), e.to_string())
                .with_raw_preview(content)
                .into()
        }
    }
}

fn llm_error_result(error: LlmError) -> ErrorResult {
    let details = error.to_string();
    match error {
        LlmError::Unreachable(_) => ErrorResult::new(ErrorCode::AiUnreachable, details),
        LlmError::Unavailable { .. } | LlmError::RequestFailed { .. } => {
            ErrorResult::new(ErrorCode::AiFailed, details)
        }
        LlmError::MalformedResponse { body, .. } => {
            ErrorResult::new(ErrorCode::JsonError, details).with_raw_preview(&body)
        }
    }
}

/// Every extractor failure is a `json_error`; `details` says whether any
/// JSON was found at all.
fn extract_error_code(error: &ExtractError) -> ErrorCode {
    match error {
        ExtractError::Empty | ExtractError::NoJson | ExtractError::MissingSteps => {
            ErrorCode::JsonError
        }
    }
}

/// Graph problems are reported in the log only; the plan goes out as is.
fn log_plan_warnings(plan: &Map<String, Value>, request: &PlanRequest) {
    let typed: Workflow = match serde_json::from_value(Value::Object(plan.clone())) {
        Ok(wf) => wf,
        Err(e) => {
            warn!("Plan steps do not follow the step schema: {}", e);
            return;
        }
    };

    let warnings = lint_plan(&typed, &request.workflow(), request.anchor_step_id);
    for warning in &warnings {
        warn!("Plan warning: {}", warning);
    }

    let approvals = typed.steps.iter().filter(|s| s.needs_approval()).count();
    info!(
        "Planned {} steps ({} need approval), {} warnings",
        typed.steps.len(),
        approvals,
        warnings.len()
    );
}
