use crate::auth::SessionState;

use super::Route;

/// Outcome of a single navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    /// Send the user to the login view; `return_to` is the route they asked for.
    RedirectToLogin { return_to: Route },
}

/// Stateless per-navigation check driven only by the session state.
pub struct RouteGuard;

impl RouteGuard {
    pub fn evaluate(session: &SessionState, requested: Route) -> GuardDecision {
        if requested.is_protected() && !session.is_authenticated() {
            GuardDecision::RedirectToLogin {
                return_to: requested,
            }
        } else {
            GuardDecision::Render(requested)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::models::ResourceKind;

    fn signed_in() -> SessionState {
        SessionState::Authenticated {
            user: Identity::named("Alice"),
            token: "abc123".to_string(),
        }
    }

    #[test]
    fn test_unauthenticated_protected_route_redirects() {
        let decision = RouteGuard::evaluate(&SessionState::Unauthenticated, Route::Dashboard);
        assert_eq!(
            decision,
            GuardDecision::RedirectToLogin {
                return_to: Route::Dashboard
            }
        );
    }

    #[test]
    fn test_every_protected_route_redirects_when_signed_out() {
        let routes = [
            Route::Dashboard,
            Route::List(ResourceKind::Users),
            Route::List(ResourceKind::Groups),
            Route::List(ResourceKind::Policies),
            Route::Detail(ResourceKind::Users, "u1".to_string()),
        ];
        for route in routes {
            assert!(matches!(
                RouteGuard::evaluate(&SessionState::Unauthenticated, route),
                GuardDecision::RedirectToLogin { .. }
            ));
        }
    }

    #[test]
    fn test_login_always_renders() {
        assert_eq!(
            RouteGuard::evaluate(&SessionState::Unauthenticated, Route::Login),
            GuardDecision::Render(Route::Login)
        );
        assert_eq!(
            RouteGuard::evaluate(&signed_in(), Route::Login),
            GuardDecision::Render(Route::Login)
        );
    }

    #[test]
    fn test_authenticated_renders_requested_route() {
        let route = Route::Detail(ResourceKind::Groups, "g1".to_string());
        assert_eq!(
            RouteGuard::evaluate(&signed_in(), route.clone()),
            GuardDecision::Render(route)
        );
    }
}
