//! HTTP surface: routes, handlers, relay, middleware

pub mod handlers;
pub mod middleware;
pub mod relay;
pub mod routes;

pub use routes::create_router;
