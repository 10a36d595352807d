//! Dashboard module
//!
//! Provides the spending totals for each category and across the whole
//! budget.

mod aggregation;
mod handlers;

pub use aggregation::{
    CategoryView, DashboardView, category_with_spending, dashboard_summary, group_by_category,
};
pub use handlers::dashboard_endpoint;
