use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "expenses.db";
pub const DEFAULT_CHART_PATH: &str = "expense_summary.svg";

/// File locations, relative to the working directory by default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub chart_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            chart_path: PathBuf::from(DEFAULT_CHART_PATH),
        }
    }
}

impl Config {
    /// Put both files under `dir`, keeping the default file names
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            db_path: dir.join(DEFAULT_DB_PATH),
            chart_path: dir.join(DEFAULT_CHART_PATH),
        }
    }
}
