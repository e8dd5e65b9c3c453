pub mod analytics;
pub mod core;
pub mod model;
pub mod rankings;
pub mod reports;
pub mod students;
