//! Secret key validation and the advisories surfaced to callers.

use std::fmt;

use toolkit_primitives::{ToolkitError, ToolkitResult};

/// Kind of Stripe API key supplied to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    /// Unrestricted secret key (`sk_*`).
    Secret,
    /// Restricted key (`rk_*`).
    Restricted,
}

impl KeyKind {
    /// Returns the advisory associated with this key kind, if any.
    #[must_use]
    pub const fn advisory(self) -> Option<Advisory> {
        match self {
            Self::Secret => Some(Advisory::DeprecatedSecretKey),
            Self::Restricted => None,
        }
    }
}

/// Non-fatal warnings emitted by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advisory {
    /// An unrestricted secret key was used.
    DeprecatedSecretKey,
    /// The call arguments carried a customer that was overridden.
    CustomerConflict {
        /// Customer found in the call arguments.
        from_args: String,
        /// Customer actually sent.
        effective: String,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeprecatedSecretKey => f.write_str(
                "Using sk_* keys with Stripe MCP is being deprecated. \
                 Please switch to rk_* (restricted keys) for better security. \
                 See: https://docs.stripe.com/keys#create-restricted-api-keys",
            ),
            Self::CustomerConflict {
                from_args,
                effective,
            } => write!(
                f,
                "Customer context conflict detected: tool args.customer ({from_args}) \
                 differs from override customer ({effective}). Using {effective}."
            ),
        }
    }
}

/// Validates the shape of a Stripe API key.
///
/// # Errors
///
/// Returns [`ToolkitError::Configuration`] for an empty key or a key that is
/// neither `sk_*` nor `rk_*`.
pub fn validate_secret_key(key: &str) -> ToolkitResult<KeyKind> {
    if key.is_empty() {
        return Err(ToolkitError::configuration("API key is required."));
    }
    if key.starts_with("sk_") {
        Ok(KeyKind::Secret)
    } else if key.starts_with("rk_") {
        Ok(KeyKind::Restricted)
    } else {
        Err(ToolkitError::configuration(
            "Invalid API key format. Expected sk_* (secret key) or rk_* (restricted key).",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restricted_key_has_no_advisory() {
        let kind = validate_secret_key("rk_test_123").unwrap();
        assert_eq!(kind, KeyKind::Restricted);
        assert_eq!(kind.advisory(), None);
    }

    #[test]
    fn secret_key_is_accepted_with_advisory() {
        let kind = validate_secret_key("sk_test_123").unwrap();
        assert_eq!(kind, KeyKind::Secret);
        assert_eq!(kind.advisory(), Some(Advisory::DeprecatedSecretKey));
    }

    #[test]
    fn rejects_empty_and_malformed_keys() {
        assert_eq!(
            validate_secret_key("").unwrap_err().to_string(),
            "API key is required."
        );
        for bad in ["pk_test_123", "invalid", "SK_test"] {
            let err = validate_secret_key(bad).unwrap_err();
            assert!(matches!(err, ToolkitError::Configuration { .. }));
            assert!(err.to_string().starts_with("Invalid API key format."));
        }
    }

    #[test]
    fn conflict_advisory_names_both_customers() {
        let advisory = Advisory::CustomerConflict {
            from_args: "cus_args".into(),
            effective: "cus_ctx".into(),
        };
        let text = advisory.to_string();
        assert!(text.contains("cus_args"));
        assert!(text.contains("Using cus_ctx"));
    }
}
