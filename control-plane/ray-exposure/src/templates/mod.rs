pub mod client;
pub mod dashboard;
pub mod manager;
pub mod names;

pub use client::ClientTemplate;
pub use dashboard::DashboardTemplate;
pub use manager::*;
