use crate::{StepId, Workflow};
use std::collections::HashSet;
use thiserror::Error;

/// Graph issues in a generated plan.
///
/// These are advisory: the plan is still returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanWarning {
    #[error("Step {0} is declared more than once")]
    DuplicateId(StepId),

    #[error("Step {0} reuses the id of an existing step")]
    ShadowsExisting(StepId),

    #[error("Step {step} points at unknown step {target}")]
    DanglingReference { step: StepId, target: StepId },

    #[error("Anchor step {0} does not exist in the current workflow")]
    UnknownAnchor(StepId),

    #[error("No new step attaches to anchor step {0}")]
    AnchorNotReferenced(StepId),
}

/// Check a plan against the workflow it extends.
pub fn lint_plan(plan: &Workflow, existing: &Workflow, anchor: Option<StepId>) -> Vec<PlanWarning> {
    let mut warnings = Vec::new();
    let existing_ids = existing.step_ids();

    let mut seen = HashSet::new();
    for step in &plan.steps {
        if !seen.insert(step.id()) {
            warnings.push(PlanWarning::DuplicateId(step.id()));
        } else if existing_ids.contains(&step.id()) {
            warnings.push(PlanWarning::ShadowsExisting(step.id()));
        }
    }

    for step in &plan.steps {
        for target in step.targets() {
            if !seen.contains(&target) && !existing_ids.contains(&target) {
                warnings.push(PlanWarning::DanglingReference {
                    step: step.id(),
                    target,
                });
            }
        }
    }

    if let Some(anchor) = anchor {
        if !existing_ids.contains(&anchor) {
            warnings.push(PlanWarning::UnknownAnchor(anchor));
        } else if !plan.references(anchor) {
            warnings.push(PlanWarning::AnchorNotReferenced(anchor));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Step;

    fn existing() -> Workflow {
        Workflow::new(vec![
            Step::action(1, "Receive order", Some(2)),
            Step::action(2, "Check stock", None),
        ])
    }

    #[test]
    fn test_clean_extension_has_no_warnings() {
        let plan = Workflow::new(vec![
            Step::decision(10, "In stock?", 11, 1),
            Step::action(11, "Ship", Some(2)),
        ]);
        assert!(lint_plan(&plan, &existing(), Some(2)).is_empty());
    }

    #[test]
    fn test_dangling_reference_reported() {
        let plan = Workflow::new(vec![Step::action(3, "Pack", Some(99))]);
        let warnings = lint_plan(&plan, &existing(), None);
        assert_eq!(
            warnings,
            vec![PlanWarning::DanglingReference {
                step: 3,
                target: 99
            }]
        );
    }

    #[test]
    fn test_duplicate_and_shadowed_ids() {
        let plan = Workflow::new(vec![
            Step::action(2, "Again", None),
            Step::action(5, "x", None),
            Step::action(5, "y", None),
        ]);
        let warnings = lint_plan(&plan, &existing(), None);
        assert!(warnings.contains(&PlanWarning::ShadowsExisting(2)));
        assert!(warnings.contains(&PlanWarning::DuplicateId(5)));
    }

    #[test]
    fn test_anchor_checks() {
        let detached = Workflow::new(vec![Step::action(3, "Float", None)]);
        assert_eq!(
            lint_plan(&detached, &existing(), Some(2)),
            vec![PlanWarning::AnchorNotReferenced(2)]
        );
        assert_eq!(
            lint_plan(&detached, &existing(), Some(42)),
            vec![PlanWarning::UnknownAnchor(42)]
        );
    }

    #[test]
    fn test_warning_messages() {
        let w = PlanWarning::DanglingReference { step: 3, target: 9 };
        assert_eq!(w.to_string(), "Step 3 points at unknown step 9");
    }
}
