//! Console routes and the route guard.
//!
//! Paths look like the web console's (`/users/42`), so a location typed by
//! the user or remembered as a return target parses back into a `Route`.

pub mod guard;
pub mod route;

pub use guard::{GuardDecision, RouteGuard};
pub use route::Route;
