pub mod activity;
pub mod models;
pub mod reporting;
