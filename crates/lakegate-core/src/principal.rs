// SPDX-License-Identifier: Apache-2.0

//! Principals and per-request permission decisions.

use serde::{Deserialize, Serialize};

const ALL_AUTHENTICATED: &str = "allAuthenticatedUsers";
const ALL_USERS: &str = "allUsers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    User,
    ServiceAccount,
}

/// The identity a request is evaluated for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    pub kind: PrincipalKind,
}

impl Principal {
    pub fn user(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            kind: PrincipalKind::User,
        }
    }

    pub fn service_account(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            kind: PrincipalKind::ServiceAccount,
        }
    }

    /// IAM member string for this principal (`user:alice@example.com`)
    pub fn member(&self) -> String {
        match self.kind {
            PrincipalKind::User => format!("user:{}", self.email),
            PrincipalKind::ServiceAccount => format!("serviceAccount:{}", self.email),
        }
    }

    pub fn domain(&self) -> Option<&str> {
        self.email.rsplit_once('@').map(|(_, domain)| domain)
    }

    /// Whether an IAM binding member covers this principal.
    ///
    /// Group membership cannot be expanded locally, so `group:` members never match.
    pub fn matches_member(&self, member: &str) -> bool {
        if member == ALL_AUTHENTICATED || member == ALL_USERS {
            return true;
        }
        let Some((kind, value)) = member.split_once(':') else {
            return false;
        };
        match kind {
            "user" => self.kind == PrincipalKind::User && value.eq_ignore_ascii_case(&self.email),
            "serviceAccount" => {
                self.kind == PrincipalKind::ServiceAccount
                    && value.eq_ignore_ascii_case(&self.email)
            }
            "domain" => self
                .domain()
                .map(|d| d.eq_ignore_ascii_case(value))
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Which stage of the permission cascade produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    Admin,
    Project,
    Dataset,
}

/// A single access verdict. Request-scoped, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDecision {
    pub principal: String,
    pub resource_key: String,
    pub granted: bool,
    pub tier: AccessTier,
}

impl PermissionDecision {
    pub fn new(
        principal: &Principal,
        resource_key: impl Into<String>,
        granted: bool,
        tier: AccessTier,
    ) -> Self {
        Self {
            principal: principal.email.clone(),
            resource_key: resource_key.into(),
            granted,
            tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_strings() {
        assert_eq!(Principal::user("a@x.com").member(), "user:a@x.com");
        assert_eq!(
            Principal::service_account("svc@p.iam.gserviceaccount.com").member(),
            "serviceAccount:svc@p.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn member_matching() {
        let alice = Principal::user("Alice@Example.com");
        assert!(alice.matches_member("user:alice@example.com"));
        assert!(alice.matches_member("domain:example.com"));
        assert!(alice.matches_member("allAuthenticatedUsers"));
        assert!(!alice.matches_member("serviceAccount:alice@example.com"));
        assert!(!alice.matches_member("group:eng@example.com"));
        assert!(!alice.matches_member("user:bob@example.com"));
        assert!(!alice.matches_member("alice@example.com"));
    }

    #[test]
    fn public_members_match_everyone() {
        let svc = Principal::service_account("svc@p.iam.gserviceaccount.com");
        assert!(svc.matches_member("allUsers"));
        assert!(Principal::user("a@x.com").matches_member("allUsers"));
        assert!(!svc.matches_member("allusers"));
    }
}
