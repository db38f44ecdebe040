//! Authenticated identity attached to requests by the auth middleware.

use cask_core::{DeployError, DeployToken};

/// The account a request acts as, plus the deploy token it authenticated
/// with. `token` is `None` only for cookie-authenticated identities, which
/// carry no scope restriction.
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub token: Option<DeployToken>,
}

impl Identity {
    pub fn from_token(token: DeployToken) -> Self {
        Self {
            username: token.username.clone(),
            token: Some(token),
        }
    }

    /// Enforce the token-scope rule for a target coordinate.
    pub fn check_scope(&self, group: &str, artifact: &str) -> Result<(), DeployError> {
        match &self.token {
            None => Ok(()),
            Some(t) if t.allows(group, artifact) => Ok(()),
            Some(t) => {
                let scope = match (t.group_name.as_deref(), t.jar_name.as_deref()) {
                    (Some(g), Some(a)) => format!("{}/{}", g, a),
                    (Some(g), None) => g.to_string(),
                    _ => "any".to_string(),
                };
                Err(DeployError::Forbidden(format!(
                    "the provided token's scope ({}) does not allow deploying to {}/{}",
                    scope, group, artifact
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn identity(group: Option<&str>, jar: Option<&str>) -> Identity {
        Identity::from_token(DeployToken {
            id: Uuid::new_v4(),
            username: "alice".into(),
            token_prefix: "ct_abc".into(),
            token_hash: String::new(),
            group_name: group.map(String::from),
            jar_name: jar.map(String::from),
            disabled: false,
            created_at: Utc::now(),
            last_used_at: None,
        })
    }

    #[test]
    fn test_cookie_identity_is_unrestricted() {
        let id = Identity {
            username: "alice".into(),
            token: None,
        };
        assert!(id.check_scope("com.ex", "lib").is_ok());
    }

    #[test]
    fn test_scope_mismatch_is_forbidden() {
        let err = identity(Some("com.other"), None)
            .check_scope("com.ex", "lib")
            .unwrap_err();
        assert_eq!(err.tag(), "deploy-forbidden");
        assert_eq!(err.status(), 403);
        assert!(err.to_string().contains("com.other"));
    }

    #[test]
    fn test_matching_scope_is_allowed() {
        assert!(identity(Some("com.ex"), Some("lib"))
            .check_scope("com.ex", "lib")
            .is_ok());
        assert!(identity(None, None).check_scope("com.ex", "lib").is_ok());
    }
}
