pub mod analyzers;
pub mod charts;
pub mod config;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod services;
