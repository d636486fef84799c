pub mod common;
pub mod config;
pub mod connectors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod views;
