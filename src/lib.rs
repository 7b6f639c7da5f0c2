pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod preview;
pub mod routes;
pub mod state;
