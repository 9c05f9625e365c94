// Expense Tracker - Core Library
// Exposes the store, reports, chart export and menu for the CLI and tests

pub mod chart;
pub mod config;
pub mod db;
pub mod error;
pub mod menu;
pub mod report;

// Re-export commonly used types
pub use chart::{render_category_chart, ChartError};
pub use config::Config;
pub use db::{resolve_date, CategoryTotal, Expense, ExpenseStore, MonthlyTotal, DATE_FORMAT};
pub use error::ExpenseError;
pub use menu::{Choice, Menu};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
