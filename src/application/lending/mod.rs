mod catalog_service;
mod errors;
mod ledger;
mod lending_service;
mod overdue_sweep;

pub use catalog_service::{
    NewBook, NewMember, add_book, get_book, get_member, list_books, list_members, register_member,
    remove_book, remove_member, search_books, set_total_copies, update_book_details, update_member,
};
pub use errors::{LendingError, Result};
pub use lending_service::{
    DashboardSummary, ServiceDependencies, dashboard_summary, get_loan, issue_loan, list_loans,
    return_loan,
};
pub use overdue_sweep::run_overdue_sweep;
