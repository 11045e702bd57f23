pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod mailing;
pub mod models;
pub mod orquestrator;
pub mod service;
pub mod sessions;
pub mod state;
pub mod views;
pub mod website;
