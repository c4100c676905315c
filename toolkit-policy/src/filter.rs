//! Allow/deny evaluation of tool names against a capability configuration.

use toolkit_config::Configuration;
use toolkit_primitives::McpTool;
use tracing::debug;

use crate::decision::PolicyDecision;
use crate::table::required_permissions;

/// Evaluates whether `tool` may be exposed under `configuration`.
///
/// Without an allow-list every tool is allowed, and tools missing from the
/// compiled table are allowed by default. A known tool is allowed only when
/// every permission it requires is granted.
#[must_use]
pub fn evaluate(tool: &str, configuration: &Configuration) -> PolicyDecision {
    let Some(actions) = configuration.effective_actions() else {
        return PolicyDecision::allow_because("no capability configuration");
    };

    let Some(required) = required_permissions(tool) else {
        return PolicyDecision::allow_because("tool has no permission requirements");
    };

    match required
        .iter()
        .find(|(resource, permission)| !actions.allows(resource, *permission))
    {
        Some((resource, permission)) => {
            PolicyDecision::deny(format!("{resource}.{permission} not granted"))
        }
        None => PolicyDecision::allow(),
    }
}

/// Returns `true` when `tool` may be exposed under `configuration`.
#[must_use]
pub fn is_tool_allowed(tool: &str, configuration: &Configuration) -> bool {
    evaluate(tool, configuration).is_allow()
}

/// Keeps the allowed tools, preserving their order.
#[must_use]
pub fn filter_tools(tools: &[McpTool], configuration: &Configuration) -> Vec<McpTool> {
    tools
        .iter()
        .filter(|tool| {
            let decision = evaluate(tool.name(), configuration);
            if decision.is_deny() {
                debug!(
                    tool = tool.name(),
                    reason = decision.reason().unwrap_or_default(),
                    "tool hidden by capability configuration"
                );
            }
            decision.is_allow()
        })
        .cloned()
        .collect()
}
