pub mod api;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod error;
pub mod intelligence;
pub mod llm;
pub mod migration;
pub mod models;
pub mod services;
pub mod session;
