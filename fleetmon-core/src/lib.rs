pub mod api;
pub mod config;
pub mod model;
pub mod reducer;
pub mod state;

// Fleet state sync
pub mod alert;
pub mod detector;
pub mod poll;

// Per-instance drill-down
pub mod detail;
pub mod merger;
