use crate::cache::{LedgerCache, Snapshot};
use crate::config::AppConfig;
use crate::error::{LedgerError, Result};
use crate::ledger::{BalancePoint, Breakdown, GridRow, Ledger, SaveReport, Totals};
use crate::saving::LedgerBackup;
use crate::store::{SheetStore, read_base_balance, write_base_balance};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

/// Figures behind the analysis view
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Summary {
    pub has_data: bool,
    pub totals: Totals,
    pub balance: Vec<BalancePoint>,
    pub categories: Vec<Breakdown>,
    pub payers: Vec<Breakdown>,
}

/// Read-clean-write cycle over the backing worksheets
///
/// Every save overwrites the worksheet and clears the cache so the next
/// read reflects what was stored.
pub struct LedgerService {
    store: Arc<dyn SheetStore>,
    config: AppConfig,
    cache: LedgerCache,
}

impl LedgerService {
    pub fn new(store: Arc<dyn SheetStore>, config: AppConfig) -> Self {
        let cache = LedgerCache::new(config.cache_ttl);
        LedgerService {
            store,
            config,
            cache,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.cache.get_or_load(|| self.load())
    }

    fn load(&self) -> Result<Snapshot> {
        let base_balance = read_base_balance(
            self.store.as_ref(),
            &self.config.config_sheet,
            self.config.default_base_balance,
        );

        let ledger = match self.store.read(&self.config.ledger_sheet) {
            Ok(table) => Ledger::from_table(&table),
            Err(LedgerError::MissingWorksheet { name }) => {
                warn!("Worksheet '{}' does not exist yet, starting with an empty ledger", name);
                Ledger::default()
            }
            Err(e) => return Err(e),
        };

        Ok(Snapshot {
            ledger,
            base_balance,
        })
    }

    /// Validates grid rows and overwrites the movements worksheet with them.
    ///
    /// When nothing survives validation the worksheet is left untouched.
    pub fn save_grid(&self, rows: &[GridRow]) -> Result<SaveReport> {
        let (ledger, report) = Ledger::from_grid(rows);
        if ledger.is_empty() {
            info!("Nothing to save: {} rows submitted, none complete", rows.len());
            return Ok(report);
        }
        self.save_ledger(&ledger)?;
        Ok(report)
    }

    pub fn save_ledger(&self, ledger: &Ledger) -> Result<()> {
        self.store
            .update(&self.config.ledger_sheet, &ledger.to_table())?;
        self.cache.invalidate();
        info!("Saved {} entries", ledger.len());
        Ok(())
    }

    pub fn set_base_balance(&self, value: i64) -> Result<()> {
        write_base_balance(self.store.as_ref(), &self.config.config_sheet, value)?;
        self.cache.invalidate();
        info!("Base balance set to {}", value);
        Ok(())
    }

    pub fn backup(&self) -> Result<LedgerBackup> {
        let snapshot = self.snapshot()?;
        Ok(LedgerBackup {
            ledger: snapshot.ledger.clone(),
            base_balance: snapshot.base_balance,
        })
    }

    pub fn restore(&self, backup: &LedgerBackup) -> Result<()> {
        let mut ledger = backup.ledger.clone();
        ledger.assign_ids();
        self.store
            .update(&self.config.ledger_sheet, &ledger.to_table())?;
        write_base_balance(
            self.store.as_ref(),
            &self.config.config_sheet,
            backup.base_balance.round() as i64,
        )?;
        self.cache.invalidate();
        info!("Restored backup with {} entries", ledger.len());
        Ok(())
    }

    /// Totals, balance trajectory and breakdowns, optionally for one month.
    ///
    /// Within a month the base is the opening balance: the configured base
    /// plus the net of everything dated before the month.
    pub fn summary(&self, month: Option<(i32, u32)>) -> Result<Summary> {
        let (ledger, base_balance) = self.scoped(month)?;
        Ok(summarize(&ledger, base_balance))
    }

    /// The ledger restricted to one month (or whole) and the balance it
    /// starts from.
    pub fn scoped(&self, month: Option<(i32, u32)>) -> Result<(Ledger, f64)> {
        let snapshot = self.snapshot()?;
        let Some((year, m)) = month else {
            return Ok((snapshot.ledger.clone(), snapshot.base_balance));
        };
        let first_day = NaiveDate::from_ymd_opt(year, m, 1)
            .ok_or_else(|| LedgerError::InvalidInput(format!("no such month {}-{:02}", year, m)))?;
        let opening = snapshot.base_balance + snapshot.ledger.net_before(first_day);
        Ok((snapshot.ledger.filter_month(year, m), opening))
    }
}

pub fn summarize(ledger: &Ledger, base_balance: f64) -> Summary {
    let balance = ledger.projected_balance(base_balance);
    Summary {
        has_data: !balance.is_empty(),
        totals: ledger.totals(base_balance),
        balance,
        categories: ledger.category_breakdown(),
        payers: ledger.payer_breakdown(),
    }
}

/// Parses a `YYYY-MM` month selector
pub fn parse_month(raw: &str) -> Option<(i32, u32)> {
    let (year, month) = raw.trim().split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}
