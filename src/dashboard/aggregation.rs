//! Spending totals for categories and the dashboard.
//!
//! Everything here is a single pass of summation over records that have
//! already been fetched. Percentages are not clamped: overspending gives
//! more than 100 and refunds (negative amounts) can push them below 0.
//! Results that overflow to infinity are rejected, since JSON cannot hold
//! them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{BudgetCategory, CategoryId},
    timestamp,
    transaction::Transaction,
};

/// A category together with how much of its budget has been spent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
    /// The id of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
    /// The amount allocated to the category.
    pub budget_amount: f64,
    /// The display color of the category.
    pub color: String,
    /// The sum of the category's transaction amounts.
    pub total_spent: f64,
    /// The budget minus the amount spent, negative when overspent.
    pub remaining_budget: f64,
    /// The amount spent as a percentage of the budget, or zero when the
    /// budget is zero.
    pub percentage_used: f64,
    /// When the category was created.
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
    /// When the category was last changed.
    #[serde(with = "timestamp")]
    pub updated_at: OffsetDateTime,
}

/// Budget totals across every category and transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    /// The sum of every category's budget.
    pub total_budget: f64,
    /// The sum of every transaction's amount.
    pub total_spent: f64,
    /// The total budget minus the total spent.
    pub remaining_budget: f64,
    /// The number of categories.
    pub categories_count: usize,
    /// The number of transactions, including those whose category is gone.
    pub transactions_count: usize,
    /// The total spent as a percentage of the total budget, or zero when
    /// there is no budget.
    pub percentage_used: f64,
}

/// `spent` as a percentage of `budget`, or zero when there is no budget.
fn percentage_used(spent: f64, budget: f64) -> f64 {
    if budget > 0.0 {
        spent / budget * 100.0
    } else {
        0.0
    }
}

fn check_finite(totals: &[f64]) -> Result<(), Error> {
    if totals.iter().all(|total| total.is_finite()) {
        Ok(())
    } else {
        tracing::error!("spending totals overflowed: {totals:?}");
        Err(Error::TotalOutOfRange)
    }
}

/// Combine `category` with the totals for `transactions`.
///
/// The caller is responsible for passing only the transactions that belong
/// to `category`.
///
/// # Errors
/// Returns an [Error::TotalOutOfRange] if any of the totals is not finite.
pub fn category_with_spending<'a>(
    category: BudgetCategory,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Result<CategoryView, Error> {
    let total_spent: f64 = transactions
        .into_iter()
        .map(|transaction| transaction.amount)
        .sum();
    let remaining_budget = category.budget_amount - total_spent;
    let percentage_used = percentage_used(total_spent, category.budget_amount);
    check_finite(&[total_spent, remaining_budget, percentage_used])?;

    Ok(CategoryView {
        remaining_budget,
        percentage_used,
        total_spent,
        id: category.id,
        name: category.name,
        budget_amount: category.budget_amount,
        color: category.color,
        created_at: category.created_at,
        updated_at: category.updated_at,
    })
}

/// Sum the budgets of `categories` and the amounts of all `transactions`.
///
/// Transactions count towards the total even if their category no longer
/// exists.
///
/// # Errors
/// Returns an [Error::TotalOutOfRange] if any of the totals is not finite.
pub fn dashboard_summary(
    categories: &[BudgetCategory],
    transactions: &[Transaction],
) -> Result<DashboardView, Error> {
    let total_budget: f64 = categories
        .iter()
        .map(|category| category.budget_amount)
        .sum();
    let total_spent: f64 = transactions
        .iter()
        .map(|transaction| transaction.amount)
        .sum();

    let remaining_budget = total_budget - total_spent;
    let percentage_used = percentage_used(total_spent, total_budget);
    check_finite(&[total_budget, total_spent, remaining_budget, percentage_used])?;

    Ok(DashboardView {
        total_budget,
        total_spent,
        remaining_budget,
        categories_count: categories.len(),
        transactions_count: transactions.len(),
        percentage_used,
    })
}

/// Group `transactions` by the category they belong to.
pub fn group_by_category(transactions: &[Transaction]) -> HashMap<&CategoryId, Vec<&Transaction>> {
    let mut groups: HashMap<&CategoryId, Vec<&Transaction>> = HashMap::new();

    for transaction in transactions {
        groups
            .entry(&transaction.category_id)
            .or_default()
            .push(transaction);
    }

    groups
}
