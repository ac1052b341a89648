pub mod analysis;
pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod models;
pub mod services;
pub mod workbook;
