//! Acceptance policies: when does reviewer feedback mean "done"?

/// Decides whether a reviewer's raw output accepts the expert's answer.
///
/// Policies are stateless and may be called any number of times.
pub trait AcceptancePolicy: Send + Sync {
    fn is_accepted(&self, reviewer_output: &str) -> bool;
}

/// Never accepts, so the loop always runs to its iteration cap.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAccept;

impl AcceptancePolicy for NeverAccept {
    fn is_accepted(&self, _reviewer_output: &str) -> bool {
        false
    }
}

/// Accepts when the reviewer output contains a token, ignoring case.
#[derive(Debug, Clone)]
pub struct ContainsToken {
    token: String,
}

impl ContainsToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into().to_uppercase(),
        }
    }
}

impl AcceptancePolicy for ContainsToken {
    fn is_accepted(&self, reviewer_output: &str) -> bool {
        !self.token.is_empty() && reviewer_output.to_uppercase().contains(&self.token)
    }
}

impl<F> AcceptancePolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_accepted(&self, reviewer_output: &str) -> bool {
        self(reviewer_output)
    }
}
