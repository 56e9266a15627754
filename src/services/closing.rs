//! Month-end closing
//!
//! Income and expense balances of a month are reversed with `close` entries
//! dated at month end and their net is booked to retained earnings with a
//! `loss and benefit` entry.

use chrono::Utc;
use uuid::Uuid;

use crate::audit::{AuditEntry, Operation};
use crate::error::LedgerResult;
use crate::models::entry::{CLOSE_REMARKS, LOSS_AND_BENEFIT_REMARKS};
use crate::models::{ChartOfAccounts, JournalEntry, Money, SubjectCode, YearMonth};
use crate::storage::Storage;

/// Set number used for closing sets
const CLOSING_SET_NUMBER: &str = "900";

#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    Closed {
        period: YearMonth,
        /// Sum of the month's income and expense balances
        net_income: Money,
        entries: Vec<JournalEntry>,
        /// Closing rows removed beforehand by a reclose
        removed: usize,
    },
    AlreadyClosed(YearMonth),
    NothingToClose(YearMonth),
}

pub struct ClosingService<'a> {
    storage: &'a Storage,
    chart: &'a ChartOfAccounts,
    retained_earnings: SubjectCode,
}

/// Month closed when none is given: the previous calendar month
pub fn default_close_month() -> YearMonth {
    YearMonth::current().previous()
}

impl<'a> ClosingService<'a> {
    pub fn new(storage: &'a Storage, chart: &'a ChartOfAccounts, retained_earnings: SubjectCode) -> Self {
        Self {
            storage,
            chart,
            retained_earnings,
        }
    }

    fn closing_entry(&self, period: YearMonth, code: SubjectCode, amount: Money, remarks: &str, batch_id: &str) -> JournalEntry {
        let date = period.last_day();
        let set_id = format!("{}_{}", date.format("%Y%m%d"), CLOSING_SET_NUMBER);
        JournalEntry {
            date,
            entry_id: format!("{}_{}", set_id, code),
            set_id,
            subject_code: code,
            amount,
            remarks: remarks.to_string(),
            subject: self.chart.name(code).map(|s| s.to_string()),
            year: period.year,
            month: period.month,
            confirmed_at: Some(Utc::now()),
            batch_id: Some(batch_id.to_string()),
        }
    }

    /// Close a month; with `reclose`, existing closing rows are replaced
    pub fn close(&self, period: YearMonth, reclose: bool) -> LedgerResult<CloseOutcome> {
        let journal = self.storage.journal();
        let tx = self.storage.connection().unchecked_transaction()?;

        let mut removed = 0;
        if journal.has_closing_entries(period)? {
            if !reclose {
                log::info!("{} is already closed", period);
                return Ok(CloseOutcome::AlreadyClosed(period));
            }
            removed = journal.delete_closing_entries(period)?;
            log::info!("removed {} closing rows of {}", removed, period);
        }

        let balances = journal.profit_and_loss_balances(period)?;
        if balances.is_empty() {
            log::info!("nothing to close for {}", period);
            return Ok(CloseOutcome::NothingToClose(period));
        }

        let batch_id = Uuid::new_v4().to_string();
        let net_income: Money = balances.iter().map(|(_, balance)| *balance).sum();

        let mut entries: Vec<JournalEntry> = balances
            .iter()
            .map(|(code, balance)| self.closing_entry(period, *code, -*balance, CLOSE_REMARKS, &batch_id))
            .collect();
        if !net_income.is_zero() {
            entries.push(self.closing_entry(
                period,
                self.retained_earnings,
                net_income,
                LOSS_AND_BENEFIT_REMARKS,
                &batch_id,
            ));
        }

        for entry in &entries {
            journal.insert(entry)?;
        }
        tx.commit()?;

        let operation = if removed > 0 { Operation::Reclose } else { Operation::Close };
        self.storage.log_audit(
            &AuditEntry::new(operation, period.to_string(), entries.len())
                .with_details(format!("net {}", net_income)),
        )?;
        log::info!("closed {}: {} entries, net {}", period, entries.len(), net_income);

        Ok(CloseOutcome::Closed {
            period,
            net_income,
            entries,
            removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        (temp_dir, Storage::new(paths).unwrap())
    }

    fn book(storage: &Storage, day: u32, set: &str, lines: &[(u32, i64)]) {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        for (idx, (code, units)) in lines.iter().enumerate() {
            storage
                .journal()
                .insert(&JournalEntry {
                    date,
                    set_id: set.to_string(),
                    entry_id: format!("{}_{:03}", set, idx),
                    subject_code: SubjectCode::new(*code),
                    amount: Money::from_units(*units),
                    remarks: "test".to_string(),
                    subject: None,
                    year: 2024,
                    month: 3,
                    confirmed_at: None,
                    batch_id: None,
                })
                .unwrap();
        }
    }

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    #[test]
    fn test_close_month() {
        let (_temp, storage) = setup();
        let chart = ChartOfAccounts::default_chart();
        book(&storage, 2, "20240302_001", &[(500, 1850), (101, -1850)]);
        book(&storage, 25, "20240325_001", &[(101, 250000), (400, -250000)]);

        let service = ClosingService::new(&storage, &chart, SubjectCode::new(300));
        let CloseOutcome::Closed { net_income, entries, removed, .. } = service.close(march(), false).unwrap() else {
            panic!("expected closing");
        };

        assert_eq!(removed, 0);
        assert_eq!(net_income, Money::from_units(-248150));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].subject_code, SubjectCode::new(400));
        assert_eq!(entries[0].amount, Money::from_units(250000));
        assert_eq!(entries[0].entry_id, "20240331_900_400");
        assert_eq!(entries[1].amount, Money::from_units(-1850));
        assert_eq!(entries[2].subject_code, SubjectCode::new(300));
        assert_eq!(entries[2].remarks, LOSS_AND_BENEFIT_REMARKS);
        assert_eq!(entries[2].amount, net_income);
        assert_eq!(entries[2].date, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());

        assert!(storage.journal().profit_and_loss_balances(march()).unwrap().is_empty());
        assert_eq!(
            service.close(march(), false).unwrap(),
            CloseOutcome::AlreadyClosed(march())
        );
    }

    #[test]
    fn test_reclose_replaces_closing_rows() {
        let (_temp, storage) = setup();
        let chart = ChartOfAccounts::default_chart();
        book(&storage, 2, "20240302_001", &[(500, 1850), (101, -1850)]);
        let service = ClosingService::new(&storage, &chart, SubjectCode::new(300));
        service.close(march(), false).unwrap();

        book(&storage, 10, "20240310_001", &[(530, 500), (101, -500)]);
        let CloseOutcome::Closed { net_income, removed, .. } = service.close(march(), true).unwrap() else {
            panic!("expected closing");
        };

        assert_eq!(removed, 2);
        assert_eq!(net_income, Money::from_units(2350));
        let closing_rows = storage
            .journal()
            .list(Some(march()))
            .unwrap()
            .into_iter()
            .filter(|e| e.remarks == CLOSE_REMARKS || e.remarks == LOSS_AND_BENEFIT_REMARKS)
            .count();
        assert_eq!(closing_rows, 3);
    }

    #[test]
    fn test_nothing_to_close() {
        let (_temp, storage) = setup();
        let chart = ChartOfAccounts::default_chart();
        book(&storage, 2, "20240302_001", &[(102, 1000), (101, -1000)]);

        let service = ClosingService::new(&storage, &chart, SubjectCode::new(300));
        assert_eq!(
            service.close(march(), false).unwrap(),
            CloseOutcome::NothingToClose(march())
        );
        assert_eq!(storage.journal().count().unwrap(), 2);
    }

    #[test]
    fn test_zero_net_skips_retained_earnings() {
        let (_temp, storage) = setup();
        let chart = ChartOfAccounts::default_chart();
        book(&storage, 2, "20240302_001", &[(500, 1000), (101, -1000)]);
        book(&storage, 3, "20240303_001", &[(101, 1000), (490, -1000)]);

        let service = ClosingService::new(&storage, &chart, SubjectCode::new(300));
        let CloseOutcome::Closed { net_income, entries, .. } = service.close(march(), false).unwrap() else {
            panic!("expected closing");
        };
        assert!(net_income.is_zero());
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.remarks == CLOSE_REMARKS));
    }
}
