use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, trace};

/// Opening code fence with an optional language tag (```json, ``` JSON, ```).
static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[ \t]*[A-Za-z0-9_+-]*").expect("fence pattern is valid"));

const FENCE: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("empty model output")]
    Empty,

    #[error("no valid plan JSON found: reply contains no JSON object")]
    NoJson,

    #[error("no valid plan JSON found: no object with a \"steps\" array")]
    MissingSteps,
}

/// Why one strategy did not produce a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    NotApplicable,
    NoCandidate,
    NotJson,
    NotObject,
    MissingSteps,
}

impl Rejection {
    /// The candidate was JSON, just not a plan.
    fn parsed(self) -> bool {
        matches!(self, Rejection::NotObject | Rejection::MissingSteps)
    }
}

type Strategy = fn(&str) -> Result<Map<String, Value>, Rejection>;

/// Tried in order; the most literal reading of the reply goes first.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", direct),
    ("fenced", fenced),
    ("balanced", balanced),
    ("outer_span", outer_span),
];

/// Recover the `{ "steps": [...] }` object from a model reply.
///
/// The object is returned exactly as the model wrote it, extra keys
/// included. Only the shape is checked: an object whose `steps` is an array.
pub fn extract_plan(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::Empty);
    }

    let mut saw_json = false;
    for (name, strategy) in STRATEGIES {
        match strategy(trimmed) {
            Ok(plan) => {
                debug!(strategy = name, "Extracted plan JSON");
                return Ok(plan);
            }
            Err(rejection) => {
                trace!(strategy = name, ?rejection, "Extraction strategy rejected reply");
                saw_json |= rejection.parsed();
            }
        }
    }

    if saw_json {
        Err(ExtractError::MissingSteps)
    } else {
        Err(ExtractError::NoJson)
    }
}

fn check_candidate(candidate: &str) -> Result<Map<String, Value>, Rejection> {
    let value: Value = serde_json::from_str(candidate).map_err(|_| Rejection::NotJson)?;
    let Value::Object(map) = value else {
        return Err(Rejection::NotObject);
    };
    if matches!(map.get("steps"), Some(Value::Array(_))) {
        Ok(map)
    } else {
        Err(Rejection::MissingSteps)
    }
}

fn direct(text: &str) -> Result<Map<String, Value>, Rejection> {
    check_candidate(text)
}

fn fenced(text: &str) -> Result<Map<String, Value>, Rejection> {
    let Some(opener) = FENCE_OPEN.find(text) else {
        return Err(Rejection::NotApplicable);
    };
    let body = &text[opener.end()..];
    let body = match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    };
    outer_span(body)
}

/// Every `{` starts a candidate, scanned to its matching `}`.
///
/// Each scan may run to the end of the text, so this is quadratic when most
/// braces never close. Replies are capped by the request's `max_tokens`
/// (a few thousand bytes), which keeps that bounded.
fn balanced(text: &str) -> Result<Map<String, Value>, Rejection> {
    let mut best = Rejection::NoCandidate;

    for (start, _) in text.match_indices('{') {
        let Some(end) = matching_brace(text, start) else {
            continue;
        };
        match check_candidate(&text[start..=end]) {
            Ok(plan) => return Ok(plan),
            Err(rejection) => {
                if rejection.parsed() || best == Rejection::NoCandidate {
                    best = rejection;
                }
            }
        }
    }

    Err(best)
}

/// First `{` to last `}` of the text.
fn outer_span(text: &str) -> Result<Map<String, Value>, Rejection> {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => check_candidate(&text[start..=end]),
        _ => Err(Rejection::NoCandidate),
    }
}

/// Byte index of the `}` closing the object opened at `start`, skipping
/// braces inside JSON strings.
fn matching_brace(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escape_next = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}
