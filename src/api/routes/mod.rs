pub mod dataset;
pub mod health;
pub mod report;
