// Plain-text rendering for the menu. Each function returns the full block
// so callers decide where it is written.

use crate::db::{Expense, MonthlyTotal};
use std::fmt::Write;

pub const NO_EXPENSES: &str = "No expenses found";
pub const NO_MONTHLY_DATA: &str = "No expenses found for monthly summary";
pub const NO_CHART_DATA: &str = "No data available for plotting";

pub fn format_amount(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// `Added expense: $12.50 for food on 2024-03-01`
pub fn confirmation(expense: &Expense) -> String {
    format!(
        "Added expense: {} for {} on {}",
        format_amount(expense.amount),
        expense.category,
        expense.date
    )
}

pub fn expense_table(expenses: &[Expense]) -> String {
    if expenses.is_empty() {
        return NO_EXPENSES.to_string();
    }

    let mut out = String::new();
    out.push_str("\nAll Expenses:\n");
    out.push_str("ID | Date | Amount | Category | Description\n");
    out.push_str(&"-".repeat(50));
    out.push('\n');

    for e in expenses {
        let _ = writeln!(
            out,
            "{} | {} | {} | {} | {}",
            e.id,
            e.date,
            format_amount(e.amount),
            e.category,
            e.description
        );
    }

    out
}

/// Month header once, then that month's category lines.
/// Relies on `rows` already being grouped by month.
pub fn monthly_summary(rows: &[MonthlyTotal]) -> String {
    if rows.is_empty() {
        return NO_MONTHLY_DATA.to_string();
    }

    let mut out = String::new();
    let mut current_month: Option<&str> = None;

    for row in rows {
        if current_month != Some(row.month.as_str()) {
            let _ = writeln!(out, "\n=== {} ===", row.month);
            current_month = Some(row.month.as_str());
        }
        let _ = writeln!(out, "{}: {}", row.category, format_amount(row.total));
    }

    out
}
