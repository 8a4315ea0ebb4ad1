pub mod api;
pub mod calendar;
pub mod commands;
pub mod components;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod utils;
