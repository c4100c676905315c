//! Strongly typed configuration schema.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use toolkit_primitives::Context;

/// A single grantable permission on a resource category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Create new objects.
    Create,
    /// Read or list existing objects.
    Read,
    /// Modify existing objects.
    Update,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
        })
    }
}

/// Permissions granted on one resource category. Absent entries are denied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    update: Option<bool>,
}

impl Permissions {
    /// Returns an empty grant.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            create: None,
            read: None,
            update: None,
        }
    }

    /// Sets the value of a single permission.
    #[must_use]
    pub const fn with(mut self, permission: Permission, granted: bool) -> Self {
        match permission {
            Permission::Create => self.create = Some(granted),
            Permission::Read => self.read = Some(granted),
            Permission::Update => self.update = Some(granted),
        }
        self
    }

    /// Returns `true` only when the permission is present and set to `true`.
    #[must_use]
    pub const fn allows(&self, permission: Permission) -> bool {
        let value = match permission {
            Permission::Create => self.create,
            Permission::Read => self.read,
            Permission::Update => self.update,
        };
        matches!(value, Some(true))
    }
}

/// Capability grants keyed by resource category (e.g. `customers`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actions(BTreeMap<String, Permissions>);

impl Actions {
    /// Creates an empty grant table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants (or explicitly denies) a permission on a resource category.
    #[must_use]
    pub fn grant(mut self, resource: impl Into<String>, permission: Permission, granted: bool) -> Self {
        let entry = self.0.entry(resource.into()).or_default();
        *entry = entry.with(permission, granted);
        self
    }

    /// Returns the permissions configured for a resource category.
    #[must_use]
    pub fn get(&self, resource: &str) -> Option<&Permissions> {
        self.0.get(resource)
    }

    /// Returns `true` when `resource` is configured and grants `permission`.
    #[must_use]
    pub fn allows(&self, resource: &str, permission: Permission) -> bool {
        self.get(resource).is_some_and(|p| p.allows(permission))
    }

    /// Returns `true` when no resource category is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over configured resource categories.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Permissions)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Settings that tune which tools are exposed and how requests are made.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Allow-list of capabilities. `None` exposes every remote tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Actions>,
    /// Connection context forwarded to the protocol client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

impl Configuration {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capability allow-list.
    #[must_use]
    pub fn with_actions(mut self, actions: Actions) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Sets the connection context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns the allow-list when one is configured and non-empty.
    #[must_use]
    pub fn effective_actions(&self) -> Option<&Actions> {
        self.actions.as_ref().filter(|a| !a.is_empty())
    }

    /// Returns the connection context, or the default one.
    #[must_use]
    pub fn context_or_default(&self) -> Context {
        self.context.clone().unwrap_or_default()
    }
}
