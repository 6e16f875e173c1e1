use crate::domain::loan::{self, Loan, LoanStatus};
use crate::domain::value_objects::{BookId, LoanId, MemberId};
use crate::ports::UpdateOutcome;
use crate::ports::loan_store::{LoanFilter, LoanStore as LoanStoreTrait, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

/// LoanStoreのインメモリ実装
pub struct LoanStore {
    loans: Mutex<HashMap<LoanId, Loan>>,
}

impl LoanStore {
    pub fn new() -> Self {
        Self {
            loans: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for LoanStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(loan: &Loan, filter: &LoanFilter) -> bool {
    filter.member_id.is_none_or(|m| loan.member_id == m)
        && filter.book_id.is_none_or(|b| loan.book_id == b)
        && filter.status.is_none_or(|s| loan.status == s)
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn insert_loan(&self, loan: &Loan) -> Result<()> {
        self.loans
            .lock()
            .unwrap()
            .insert(loan.loan_id, loan.clone());
        Ok(())
    }

    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.loans.lock().unwrap().get(&loan_id).cloned())
    }

    async fn mark_returned(
        &self,
        loan_id: LoanId,
        returned_on: NaiveDate,
    ) -> Result<UpdateOutcome> {
        let mut loans = self.loans.lock().unwrap();
        match loans.get_mut(&loan_id) {
            Some(loan) if !loan.status.is_returned() => {
                loan.status = LoanStatus::Returned;
                loan.return_date = Some(returned_on);
                Ok(UpdateOutcome::Applied)
            }
            _ => Ok(UpdateOutcome::NotApplied),
        }
    }

    async fn mark_overdue_until(&self, today: NaiveDate) -> Result<u64> {
        let mut loans = self.loans.lock().unwrap();
        let mut reclassified = 0;
        for loan in loans.values_mut() {
            if let Some(overdue) = loan::classify_overdue(loan, today) {
                *loan = overdue;
                reclassified += 1;
            }
        }
        Ok(reclassified)
    }

    async fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<Loan>> {
        let mut loans: Vec<Loan> = self
            .loans
            .lock()
            .unwrap()
            .values()
            .filter(|l| matches(l, filter))
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.borrow_date.cmp(&a.borrow_date));
        Ok(loans)
    }

    async fn count_open_for_book(&self, book_id: BookId) -> Result<u64> {
        let loans = self.loans.lock().unwrap();
        Ok(loans
            .values()
            .filter(|l| l.book_id == book_id && l.status.is_open())
            .count() as u64)
    }

    async fn count_open_for_member(&self, member_id: MemberId) -> Result<u64> {
        let loans = self.loans.lock().unwrap();
        Ok(loans
            .values()
            .filter(|l| l.member_id == member_id && l.status.is_open())
            .count() as u64)
    }

    async fn count_by_status(&self, status: LoanStatus) -> Result<u64> {
        let loans = self.loans.lock().unwrap();
        Ok(loans.values().filter(|l| l.status == status).count() as u64)
    }
}
