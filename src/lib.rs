//! Habita - A rental real-estate marketplace backend
//!
//! This library provides the core functionality for the Habita marketplace.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
