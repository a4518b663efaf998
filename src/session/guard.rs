use crate::session::state::{Phase, Role, Session};

/// Predicate a protected view places on the session
#[derive(Debug, Clone, Default)]
pub struct RouteRequirement {
    pub require_auth: bool,
    /// When set, the user's role must be one of these
    pub allowed_roles: Option<Vec<Role>>,
    pub require_verified_email: bool,
}

impl RouteRequirement {
    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            require_auth: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn role(role: Role) -> Self {
        Self {
            require_auth: true,
            allowed_roles: Some(vec![role]),
            require_verified_email: false,
        }
    }

    #[must_use]
    pub fn verified() -> Self {
        Self {
            require_auth: true,
            allowed_roles: None,
            require_verified_email: true,
        }
    }
}

/// Outcome of evaluating a requirement against the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    /// Startup check still in flight; suspend rendering
    Loading,
    /// Carries the original destination for post-login redirect
    RedirectToLogin { return_to: String },
    AccessDenied,
    RedirectToVerification,
}

/// Pure read + branch over the current session; never mutates state
#[must_use]
pub fn evaluate(
    session: &Session,
    requirement: &RouteRequirement,
    destination: &str,
) -> RouteDecision {
    if session.phase() == Phase::Loading {
        return RouteDecision::Loading;
    }

    if requirement.require_auth && !session.is_authenticated() {
        return RouteDecision::RedirectToLogin {
            return_to: destination.to_string(),
        };
    }

    if let (Some(allowed), Some(user)) = (requirement.allowed_roles.as_ref(), session.user.as_ref())
    {
        if !allowed.contains(&user.role) {
            return RouteDecision::AccessDenied;
        }
    }

    if requirement.require_verified_email && !session.is_email_verified() {
        return RouteDecision::RedirectToVerification;
    }

    RouteDecision::Allow
}
