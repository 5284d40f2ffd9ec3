pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod page;
pub mod process;
