pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod input;
pub mod lineage;
pub mod output;
pub mod plutof;
pub mod resolver;
