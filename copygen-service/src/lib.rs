//! copygen-service: an HTTP endpoint that turns a product description and a
//! formatting template into marketing copy via an LLM provider.

pub mod config;
pub mod handlers;
pub mod prompt;
pub mod services;
pub mod startup;
