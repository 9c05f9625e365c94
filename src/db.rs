use crate::error::{ExpenseError, Result};
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Strict storage and input format for expense dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One persisted expense row
/// Rows are create-only: nothing in this crate updates or deletes them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Assigned by SQLite on insert, never reused
    pub id: i64,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
}

/// Sum of amounts for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Sum of amounts for one (month, category) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub category: String,
    pub total: f64,
}

/// Owns the SQLite connection for the process lifetime
pub struct ExpenseStore {
    conn: Connection,
}

impl ExpenseStore {
    /// Open (or create) the database file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened expense database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Create the expenses table if missing. Safe to call on every startup.
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                description TEXT,
                date DATE NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
            [],
        )?;

        debug!("expenses schema ready");
        Ok(())
    }

    /// Validate and insert one expense
    ///
    /// `date_text` must be strict `YYYY-MM-DD`; `None` or blank means today.
    /// Any validation failure returns before the INSERT, so a rejected add
    /// never changes the table.
    pub fn add_expense(
        &self,
        amount: f64,
        category: &str,
        description: Option<&str>,
        date_text: Option<&str>,
    ) -> Result<Expense> {
        let today = Local::now().date_naive();
        let expense = match validate(amount, category, description, date_text, today) {
            Ok(expense) => expense,
            Err(e) => {
                debug!(error = %e, "rejected expense");
                return Err(e);
            }
        };

        self.conn.execute(
            "INSERT INTO expenses (amount, category, description, date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                expense.amount,
                expense.category,
                expense.description,
                expense.date,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(id, category = %expense.category, "inserted expense");

        Ok(Expense { id, ..expense })
    }

    /// All records, newest date first; same-day records keep insertion order
    pub fn list_expenses(&self) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, amount, category, description, date
             FROM expenses
             ORDER BY date DESC, id ASC",
        )?;

        let expenses = stmt
            .query_map([], expense_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(rows = expenses.len(), "listed expenses");
        Ok(expenses)
    }

    /// Totals per (month, category), newest month first, biggest total first within a month
    pub fn monthly_summary(&self) -> Result<Vec<MonthlyTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT strftime('%Y-%m', date) AS month,
                    category,
                    SUM(amount) AS total
             FROM expenses
             GROUP BY month, category
             ORDER BY month DESC, total DESC, category ASC",
        )?;

        let summary = stmt
            .query_map([], |row| {
                Ok(MonthlyTotal {
                    month: row.get(0)?,
                    category: row.get(1)?,
                    total: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(rows = summary.len(), "computed monthly summary");
        Ok(summary)
    }

    /// Totals per category, biggest first
    pub fn category_totals(&self) -> Result<Vec<CategoryTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, SUM(amount) AS total
             FROM expenses
             GROUP BY category
             ORDER BY total DESC, category ASC",
        )?;

        let totals = stmt
            .query_map([], |row| {
                Ok(CategoryTotal {
                    category: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(rows = totals.len(), "computed category totals");
        Ok(totals)
    }

    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;

        Ok(count)
    }
}

/// Maps `SELECT id, amount, category, description, date`
fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    let description: Option<String> = row.get(3)?;

    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        category: row.get(2)?,
        description: description.unwrap_or_default(),
        date: row.get(4)?,
    })
}

/// Build the row to insert, or say why not. `id` is left at 0.
fn validate(
    amount: f64,
    category: &str,
    description: Option<&str>,
    date_text: Option<&str>,
    today: NaiveDate,
) -> Result<Expense> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ExpenseError::InvalidAmount(amount.to_string()));
    }

    let category = category.trim();
    if category.is_empty() {
        return Err(ExpenseError::MissingCategory);
    }

    Ok(Expense {
        id: 0,
        amount,
        category: category.to_string(),
        description: description.unwrap_or_default().to_string(),
        date: resolve_date(date_text, today)?,
    })
}

/// Parse a `YYYY-MM-DD` date, falling back to `today` when absent or blank
///
/// chrono alone accepts `2024-3-1`, so the 4-2-2 digit shape is checked first.
pub fn resolve_date(date_text: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    let text = match date_text.map(str::trim) {
        None | Some("") => return Ok(today),
        Some(text) => text,
    };

    let bytes = text.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });

    if !well_formed {
        return Err(ExpenseError::InvalidDateFormat(text.to_string()));
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| ExpenseError::InvalidDateFormat(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn seeded_store(rows: &[(f64, &str, &str)]) -> ExpenseStore {
        let store = ExpenseStore::open_in_memory().unwrap();
        for (amount, category, day) in rows {
            store.add_expense(*amount, category, None, Some(*day)).unwrap();
        }
        store
    }

    #[test]
    fn test_add_expense_with_explicit_date() {
        let store = ExpenseStore::open_in_memory().unwrap();

        let added = store
            .add_expense(12.50, "food", Some("lunch"), Some("2024-03-01"))
            .unwrap();

        assert_eq!(added.amount, 12.50);
        assert_eq!(added.category, "food");
        assert_eq!(added.date, date("2024-03-01"));

        let all = store.list_expenses().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], added);
        assert_eq!(all[0].description, "lunch");
    }

    #[test]
    fn test_invalid_date_does_not_write() {
        let store = ExpenseStore::open_in_memory().unwrap();
        store.add_expense(5.0, "coffee", None, Some("2024-03-02")).unwrap();

        let result = store.add_expense(12.50, "food", None, Some("2024-13-40"));

        assert!(matches!(result, Err(ExpenseError::InvalidDateFormat(ref s)) if s == "2024-13-40"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_missing_date_uses_today() {
        let store = ExpenseStore::open_in_memory().unwrap();

        let before = Local::now().date_naive();
        let added = store.add_expense(3.0, "bus", None, None).unwrap();
        let blank = store.add_expense(4.0, "bus", None, Some("   ")).unwrap();
        let after = Local::now().date_naive();

        for e in [added, blank] {
            assert!(e.date == before || e.date == after, "{} is not today", e.date);
        }
    }

    #[test]
    fn test_resolve_date_is_strict() {
        let today = date("2024-06-15");

        assert_eq!(resolve_date(None, today).unwrap(), today);
        assert_eq!(resolve_date(Some(""), today).unwrap(), today);
        assert_eq!(
            resolve_date(Some(" 2024-02-29 "), today).unwrap(),
            date("2024-02-29")
        );

        for bad in ["2024-3-1", "2024/03/01", "01-03-2024", "2023-02-29", "2024-03-01T10:00", "tomorrow"] {
            assert!(
                matches!(resolve_date(Some(bad), today), Err(ExpenseError::InvalidDateFormat(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_bad_amount_and_category() {
        let store = ExpenseStore::open_in_memory().unwrap();

        assert!(matches!(
            store.add_expense(0.0, "food", None, None),
            Err(ExpenseError::InvalidAmount(_))
        ));
        assert!(matches!(
            store.add_expense(-4.0, "food", None, None),
            Err(ExpenseError::InvalidAmount(_))
        ));
        assert!(matches!(
            store.add_expense(f64::NAN, "food", None, None),
            Err(ExpenseError::InvalidAmount(_))
        ));
        assert!(matches!(
            store.add_expense(4.0, "  ", None, None),
            Err(ExpenseError::MissingCategory)
        ));

        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_ids_increase() {
        let store = ExpenseStore::open_in_memory().unwrap();

        let a = store.add_expense(1.0, "a", None, Some("2024-01-01")).unwrap();
        let b = store.add_expense(2.0, "b", None, Some("2024-01-01")).unwrap();

        assert!(b.id > a.id);
        assert_eq!(store.list_expenses().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_rejected_add_is_quiet_at_warn_level() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer({
                let logs = logs.clone();
                move || logs.clone()
            })
            .finish();

        let store = ExpenseStore::open_in_memory().unwrap();
        tracing::subscriber::with_default(subscriber, || {
            assert!(store.add_expense(1.0, "food", None, Some("2024-13-40")).is_err());
            assert!(store.add_expense(-1.0, "food", None, None).is_err());
        });

        assert!(logs.contents().is_empty(), "unexpected log output: {}", logs.contents());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }


    #[test]
    fn test_list_empty_store() {
        let store = ExpenseStore::open_in_memory().unwrap();
        assert!(store.list_expenses().unwrap().is_empty());
    }

    #[test]
    fn test_list_orders_by_date_desc_then_id() {
        let store = seeded_store(&[
            (1.0, "first", "2024-01-10"),
            (2.0, "second", "2024-02-01"),
            (3.0, "third", "2024-01-10"),
        ]);

        let categories: Vec<String> = store
            .list_expenses()
            .unwrap()
            .into_iter()
            .map(|e| e.category)
            .collect();

        assert_eq!(categories, vec!["second", "first", "third"]);
    }

    #[test]
    fn test_monthly_summary_two_categories_one_month() {
        let store = seeded_store(&[
            (10.0, "food", "2024-03-01"),
            (2.5, "transport", "2024-03-02"),
            (7.25, "food", "2024-03-15"),
            (1.5, "transport", "2024-03-20"),
        ]);

        let summary = store.monthly_summary().unwrap();

        assert_eq!(
            summary,
            vec![
                MonthlyTotal { month: "2024-03".into(), category: "food".into(), total: 17.25 },
                MonthlyTotal { month: "2024-03".into(), category: "transport".into(), total: 4.0 },
            ]
        );
    }

    #[test]
    fn test_monthly_summary_orders_months_desc() {
        let store = seeded_store(&[
            (5.0, "food", "2023-12-31"),
            (1.0, "rent", "2024-01-01"),
            (9.0, "food", "2024-01-05"),
        ]);

        let summary = store.monthly_summary().unwrap();
        let keys: Vec<(&str, &str)> = summary
            .iter()
            .map(|m| (m.month.as_str(), m.category.as_str()))
            .collect();

        assert_eq!(
            keys,
            vec![("2024-01", "food"), ("2024-01", "rent"), ("2023-12", "food")]
        );
    }

    #[test]
    fn test_category_totals_independent_of_insertion_order() {
        let rows = [
            (4.0, "fun", "2024-01-01"),
            (0.5, "food", "2024-02-01"),
            (8.0, "rent", "2024-03-01"),
            (3.0, "food", "2024-04-01"),
            (0.25, "fun", "2024-05-01"),
        ];
        let mut reversed = rows;
        reversed.reverse();

        for order in [&rows[..], &reversed[..]] {
            let totals = seeded_store(order).category_totals().unwrap();
            assert_eq!(
                totals,
                vec![
                    CategoryTotal { category: "rent".into(), total: 8.0 },
                    CategoryTotal { category: "fun".into(), total: 4.25 },
                    CategoryTotal { category: "food".into(), total: 3.5 },
                ]
            );
        }
    }

    #[test]
    fn test_initialize_is_idempotent_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.db");

        {
            let store = ExpenseStore::open(&path).unwrap();
            store.initialize().unwrap();
            store.add_expense(42.0, "books", None, Some("2024-05-05")).unwrap();
        }

        let reopened = ExpenseStore::open(&path).unwrap();
        let all = reopened.list_expenses().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].category, "books");
        assert_eq!(all[0].date, date("2024-05-05"));
    }

    #[test]
    fn test_null_description_reads_as_empty() {
        let store = ExpenseStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO expenses (amount, category, description, date)
                 VALUES (1.0, 'misc', NULL, '2024-01-01')",
                [],
            )
            .unwrap();

        let all = store.list_expenses().unwrap();
        assert_eq!(all[0].description, "");
    }

    #[test]
    fn test_expense_serializes_date_as_iso() {
        let expense = Expense {
            id: 7,
            amount: 12.5,
            category: "food".into(),
            description: String::new(),
            date: date("2024-03-01"),
        };

        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["amount"], 12.5);
    }
}
