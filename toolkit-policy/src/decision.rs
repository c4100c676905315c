//! Decisions produced by the permission filter.

/// Describes the outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    /// Tool is exposed.
    Allow,
    /// Tool is hidden from callers.
    Deny,
}

/// Structured decision for a single tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    kind: DecisionKind,
    reason: Option<String>,
}

impl PolicyDecision {
    /// Returns an allow decision with no additional context.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            kind: DecisionKind::Allow,
            reason: None,
        }
    }

    /// Returns an allow decision annotated with why it was allowed.
    #[must_use]
    pub fn allow_because(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Allow,
            reason: Some(reason.into()),
        }
    }

    /// Returns a deny decision with an explanatory reason.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Deny,
            reason: Some(reason.into()),
        }
    }

    /// Returns the decision kind.
    #[must_use]
    pub fn kind(&self) -> DecisionKind {
        self.kind
    }

    /// Returns true when the tool may be exposed.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        self.kind == DecisionKind::Allow
    }

    /// Returns true when the tool must be hidden.
    #[must_use]
    pub fn is_deny(&self) -> bool {
        self.kind == DecisionKind::Deny
    }

    /// Returns the optional reason associated with the decision.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}
