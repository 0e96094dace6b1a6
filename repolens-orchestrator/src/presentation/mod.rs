//! HTTP presentation layer: DTOs, controllers and route wiring.

pub mod controllers;
pub mod models;
pub mod routes;

pub use routes::{AppState, create_router};
