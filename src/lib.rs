pub mod config;
pub mod controller;
pub mod devices;
pub mod error;
pub mod helpers;
pub mod models;
pub mod repositories;
