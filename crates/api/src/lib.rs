//! HTTP surface: server wiring, routing, session middleware.

pub mod app;
pub mod context;
pub mod middleware;
