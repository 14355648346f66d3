//! The expert → reviewer refinement loop.

use tracing::{debug, info, warn};

use crate::error::{RefineError, TemplateError};
use crate::llm::{Bindings, Extraction, LanguageModel, PromptTemplate, extract_structured};

use super::policy::{AcceptancePolicy, NeverAccept};
use super::record::{IterationRecord, RefinementResult, Role, Termination};

/// Binding holding the raw context the expert works from.
pub const RAW_TEXT: &str = "raw_text";
/// Binding holding the previous reviewer output (empty on the first pass).
pub const REVIEWER_FEEDBACK: &str = "reviewer_feedback";
/// Binding holding the previous extracted output (empty on the first pass).
pub const PREVIOUS_OUTPUT: &str = "previous_output";
/// Binding holding the current extracted output, shown to the reviewer.
pub const EXTRACTED_OUTPUT: &str = "extracted_output";

/// Iteration cap used when none is configured.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// Runs bounded expert/reviewer passes until the acceptance policy is
/// satisfied or the iteration budget is spent.
///
/// The loop owns no state between calls to [`refine`](Self::refine), so one
/// instance can serve any number of concurrent invocations.
pub struct RefinementLoop<'a> {
    expert: &'a dyn LanguageModel,
    reviewer: &'a dyn LanguageModel,
    max_iterations: usize,
    policy: Box<dyn AcceptancePolicy + 'a>,
}

impl<'a> RefinementLoop<'a> {
    pub fn new(expert: &'a dyn LanguageModel, reviewer: &'a dyn LanguageModel) -> Self {
        Self {
            expert,
            reviewer,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            policy: Box::new(NeverAccept),
        }
    }

    /// Set the iteration budget. Zero means no model is ever called.
    #[must_use]
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Replace the default never-accept policy.
    #[must_use]
    pub fn acceptance(mut self, policy: impl AcceptancePolicy + 'a) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Refine `raw_context` into a structured answer.
    ///
    /// # Errors
    ///
    /// Returns `RefineError::Render` if a template references a name that is
    /// neither in `extra` nor supplied by the loop, and
    /// `RefineError::ModelInvocation` if either model call fails. Both abort
    /// the whole refinement; no partial result is returned.
    pub async fn refine(
        &self,
        raw_context: &str,
        expert_template: &PromptTemplate,
        reviewer_template: &PromptTemplate,
        extra: &Bindings,
    ) -> Result<RefinementResult, RefineError> {
        if self.max_iterations == 0 {
            debug!("max_iterations is 0, skipping refinement");
            return Ok(RefinementResult::exhausted_without_iterations());
        }

        // Fail before spending any tokens on a template that can never render.
        let preflight = expert_bindings(extra, raw_context, "", "");
        expert_template
            .check(&preflight)
            .map_err(|e| render_error(1, Role::Expert, e))?;
        reviewer_template
            .check(&reviewer_bindings(extra, ""))
            .map_err(|e| render_error(1, Role::Reviewer, e))?;

        let mut log: Vec<IterationRecord> = Vec::with_capacity(self.max_iterations);
        let mut current: Option<Extraction> = None;
        let mut feedback = String::new();
        let mut terminated_by = Termination::Exhausted;

        for iteration in 1..=self.max_iterations {
            info!(iteration, max = self.max_iterations, "Starting refinement iteration");

            let previous = current.as_ref().map(Extraction::as_text).unwrap_or_default();
            let expert_prompt = expert_template
                .render(&expert_bindings(extra, raw_context, &feedback, &previous))
                .map_err(|e| render_error(iteration, Role::Expert, e))?;

            let expert_output = self
                .expert
                .complete(&expert_prompt)
                .await
                .map_err(|source| RefineError::ModelInvocation {
                    iteration,
                    role: Role::Expert,
                    source,
                })?;
            debug!(
                iteration,
                prompt_chars = expert_prompt.len(),
                output_chars = expert_output.len(),
                "Expert pass complete"
            );

            let extraction = extract_structured(&expert_output);
            if !extraction.ok {
                warn!(
                    iteration,
                    details = %extraction.value["details"],
                    "Expert output is not valid structured data, forwarding diagnostic to reviewer"
                );
            }
            let extracted_text = extraction.as_text();
            current = Some(extraction);

            let reviewer_prompt = reviewer_template
                .render(&reviewer_bindings(extra, &extracted_text))
                .map_err(|e| render_error(iteration, Role::Reviewer, e))?;

            let reviewer_output = self
                .reviewer
                .complete(&reviewer_prompt)
                .await
                .map_err(|source| RefineError::ModelInvocation {
                    iteration,
                    role: Role::Reviewer,
                    source,
                })?;

            let accepted = self.policy.is_accepted(&reviewer_output);
            debug!(iteration, accepted, "Reviewer pass complete");

            log.push(IterationRecord {
                iteration,
                expert_prompt,
                expert_output,
                reviewer_prompt,
                reviewer_output: reviewer_output.clone(),
                accepted,
            });

            if accepted {
                terminated_by = Termination::Accepted;
                break;
            }
            feedback = reviewer_output;
        }

        info!(
            iterations = log.len(),
            terminated_by = ?terminated_by,
            "Refinement finished"
        );

        Ok(RefinementResult {
            final_output: current,
            log,
            terminated_by,
        })
    }
}

fn expert_bindings(extra: &Bindings, raw_context: &str, feedback: &str, previous: &str) -> Bindings {
    extra.merged(
        &Bindings::new()
            .with(RAW_TEXT, raw_context)
            .with(REVIEWER_FEEDBACK, feedback)
            .with(PREVIOUS_OUTPUT, previous),
    )
}

fn reviewer_bindings(extra: &Bindings, extracted: &str) -> Bindings {
    extra.merged(&Bindings::new().with(EXTRACTED_OUTPUT, extracted))
}

fn render_error(iteration: usize, role: Role, source: TemplateError) -> RefineError {
    RefineError::Render {
        iteration,
        role,
        source,
    }
}
