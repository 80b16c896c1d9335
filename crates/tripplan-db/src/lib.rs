//! Durable storage for trips and their generated day plans.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
