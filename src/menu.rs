use crate::chart::{self, ChartError};
use crate::config::Config;
use crate::db::ExpenseStore;
use crate::report;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::debug;

const MENU: &str = "\nExpense Tracker Menu:
1. Add Expense
2. View All Expenses
3. View Monthly Summary
4. Plot Expenses by Category
5. Exit";

const INVALID_AMOUNT: &str = "Invalid amount. Please enter a number.";
const INVALID_CHOICE: &str = "Invalid choice. Please try again.";
const FAREWELL: &str = "Thank you for using Expense Tracker!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Add,
    List,
    MonthlySummary,
    Plot,
    Exit,
}

impl Choice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Choice::Add),
            "2" => Some(Choice::List),
            "3" => Some(Choice::MonthlySummary),
            "4" => Some(Choice::Plot),
            "5" => Some(Choice::Exit),
            _ => None,
        }
    }
}

/// Line-oriented prompt loop over any reader/writer pair
pub struct Menu<'a, R, W> {
    store: &'a ExpenseStore,
    config: &'a Config,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(store: &'a ExpenseStore, config: &'a Config, input: R, output: W) -> Self {
        Self {
            store,
            config,
            input,
            output,
        }
    }

    /// Loop until "5" or end of input. Only storage and file errors escape.
    pub fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.output, "{}", MENU)?;

            let Some(line) = self.prompt("\nEnter your choice (1-5): ")? else {
                debug!("input closed, leaving menu");
                return Ok(());
            };

            match Choice::parse(&line) {
                Some(Choice::Add) => {
                    if !self.add_expense()? {
                        return Ok(());
                    }
                }
                Some(Choice::List) => {
                    let expenses = self.store.list_expenses()?;
                    writeln!(self.output, "{}", report::expense_table(&expenses))?;
                }
                Some(Choice::MonthlySummary) => {
                    let summary = self.store.monthly_summary()?;
                    writeln!(self.output, "{}", report::monthly_summary(&summary))?;
                }
                Some(Choice::Plot) => self.plot()?,
                Some(Choice::Exit) => {
                    writeln!(self.output, "{}", FAREWELL)?;
                    return Ok(());
                }
                None => writeln!(self.output, "{}", INVALID_CHOICE)?,
            }
        }
    }

    /// Returns `Ok(false)` if input ran out mid-prompt
    fn add_expense(&mut self) -> Result<bool> {
        let Some(amount_text) = self.prompt("Enter amount: ")? else {
            return Ok(false);
        };

        let amount = match amount_text.trim().parse::<f64>() {
            Ok(amount) if amount.is_finite() => amount,
            _ => {
                writeln!(self.output, "{}", INVALID_AMOUNT)?;
                return Ok(true);
            }
        };

        let Some(category) = self.prompt("Enter category: ")? else {
            return Ok(false);
        };
        let Some(description) = self.prompt("Enter description (optional): ")? else {
            return Ok(false);
        };
        let Some(date_text) = self.prompt("Enter date (YYYY-MM-DD) or press Enter for today: ")?
        else {
            return Ok(false);
        };

        let description = Some(description.as_str()).filter(|d| !d.is_empty());

        match self
            .store
            .add_expense(amount, &category, description, Some(date_text.as_str()))
        {
            Ok(expense) => writeln!(self.output, "{}", report::confirmation(&expense))?,
            Err(e) if e.is_recoverable() => writeln!(self.output, "{}", e)?,
            Err(e) => return Err(e).context("Failed to save expense"),
        }

        Ok(true)
    }

    fn plot(&mut self) -> Result<()> {
        let totals = self.store.category_totals()?;
        let path = &self.config.chart_path;

        match chart::render_category_chart(&totals, path) {
            Ok(()) => writeln!(
                self.output,
                "\nExpense summary plot has been saved as \"{}\"",
                path.display()
            )?,
            Err(ChartError::NoData) => writeln!(self.output, "{}", report::NO_CHART_DATA)?,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to write chart to {}", path.display()))
            }
        }

        Ok(())
    }

    /// Print `text`, read one line with its newline stripped. `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).to_string();
        Ok(Some(trimmed))
    }
}
