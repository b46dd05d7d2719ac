//! HTTP API handlers for educafric-roles

pub mod auth;
pub mod detect;
pub mod health;
pub mod schools;
pub mod user_roles;

pub use auth::{login, logout, session_middleware, RequestContext, SessionUser};
pub use detect::{detect_roles, register_multi_role};
pub use health::health_routes;
pub use schools::{get_teacher_schools, switch_school};
pub use user_roles::{add_role, get_user_roles, role_history, set_role_activation, switch_role};
