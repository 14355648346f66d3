//! Iteration log and final result of a refinement.

use std::fmt;

use serde::Serialize;

use crate::llm::{Extraction, extract_structured};

/// Which side of the loop a model call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Expert,
    Reviewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Expert => "expert",
            Role::Reviewer => "reviewer",
        })
    }
}

/// One expert → reviewer pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    /// 1-based.
    pub iteration: usize,
    pub expert_prompt: String,
    pub expert_output: String,
    pub reviewer_prompt: String,
    pub reviewer_output: String,
    pub accepted: bool,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Termination {
    Accepted,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementResult {
    /// Extraction of the most recent expert output; `None` only when no
    /// iteration ran.
    pub final_output: Option<Extraction>,
    pub log: Vec<IterationRecord>,
    pub terminated_by: Termination,
}

impl RefinementResult {
    pub(crate) fn exhausted_without_iterations() -> Self {
        Self {
            final_output: None,
            log: Vec::new(),
            terminated_by: Termination::Exhausted,
        }
    }

    pub fn accepted(&self) -> bool {
        self.terminated_by == Termination::Accepted
    }

    /// The final structured value, if extraction succeeded on the last pass.
    pub fn structured_output(&self) -> Option<&serde_json::Value> {
        self.final_output
            .as_ref()
            .filter(|extraction| extraction.ok)
            .map(|extraction| &extraction.value)
    }

    /// The most recent structured value any expert pass produced.
    ///
    /// Unlike [`structured_output`](Self::structured_output), an unparseable
    /// last pass does not hide a valid answer from an earlier iteration.
    pub fn last_structured_output(&self) -> Option<serde_json::Value> {
        if let Some(value) = self.structured_output() {
            return Some(value.clone());
        }
        self.log
            .iter()
            .rev()
            .map(|record| extract_structured(&record.expert_output))
            .find(|extraction| extraction.ok)
            .map(|extraction| extraction.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn termination_serializes_upper_case() {
        assert_eq!(serde_json::to_value(Termination::Accepted).unwrap(), json!("ACCEPTED"));
        assert_eq!(serde_json::to_value(Termination::Exhausted).unwrap(), json!("EXHAUSTED"));
    }

    #[test]
    fn log_entry_shape() {
        let record = IterationRecord {
            iteration: 1,
            expert_prompt: "e".to_string(),
            expert_output: "[1]".to_string(),
            reviewer_prompt: "r".to_string(),
            reviewer_output: "ok".to_string(),
            accepted: false,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "iteration": 1,
                "expert_prompt": "e",
                "expert_output": "[1]",
                "reviewer_prompt": "r",
                "reviewer_output": "ok",
                "accepted": false
            })
        );
    }

    fn record(iteration: usize, expert_output: &str) -> IterationRecord {
        IterationRecord {
            iteration,
            expert_prompt: String::new(),
            expert_output: expert_output.to_string(),
            reviewer_prompt: String::new(),
            reviewer_output: String::new(),
            accepted: false,
        }
    }

    #[test]
    fn earlier_valid_answer_survives_garbled_last_pass() {
        let result = RefinementResult {
            final_output: Some(extract_structured("sorry, I cannot help")),
            log: vec![
                record(1, r#"[{"date": "2025-07-01"}]"#),
                record(2, r#"[{"date": "2025-07-02"}]"#),
                record(3, "sorry, I cannot help"),
            ],
            terminated_by: Termination::Exhausted,
        };
        assert!(result.structured_output().is_none());
        assert_eq!(
            result.last_structured_output(),
            Some(json!([{"date": "2025-07-02"}]))
        );
    }

    #[test]
    fn no_valid_answer_anywhere() {
        let result = RefinementResult {
            final_output: Some(extract_structured("nothing")),
            log: vec![record(1, "nothing")],
            terminated_by: Termination::Exhausted,
        };
        assert!(result.last_structured_output().is_none());
    }

    #[test]
    fn empty_result_has_no_structured_output() {
        let result = RefinementResult::exhausted_without_iterations();
        assert!(result.structured_output().is_none());
        assert!(!result.accepted());
    }
}
