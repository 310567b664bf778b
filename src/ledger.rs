use crate::coerce::{
    amount_from_json, date_from_json, id_from_json, kind_from_json, parse_amount, parse_category,
    parse_date, parse_id, parse_kind, parse_text, text_from_json,
};
use crate::entry::{
    COL_AMOUNT, COL_CATEGORY, COL_CONCEPT, COL_DATE, COL_ID, COL_KIND, COL_PAYMENT_METHOD,
    COL_RESPONSIBLE, COLUMNS, Entry, canonical_category,
};
use crate::store::Table;
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Label used in breakdowns for expenses with no category
pub const NO_CATEGORY: &str = "Sin categoría";

/// Label used in breakdowns for expenses with no responsible party
pub const NO_RESPONSIBLE: &str = "Sin asignar";

/// The household ledger: every row of the movements worksheet
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Ledger {
    pub entries: Vec<Entry>,
}

/// Headline figures shown above the grid
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Totals {
    pub base: f64,
    pub spent: f64,
    pub credited: f64,
    pub available: f64,
}

/// One step of the projected balance trajectory
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct BalancePoint {
    pub date: NaiveDate,
    /// Credits minus expenses booked on this day
    pub net: f64,
    /// Base balance plus every net up to and including this day
    pub balance: f64,
}

/// Total spent under one label (category or responsible party)
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Breakdown {
    pub label: String,
    pub amount: f64,
}

/// Outcome of re-validating rows coming back from the editable grid
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct SaveReport {
    pub kept: usize,
    pub dropped: usize,
    pub assigned_ids: Vec<u64>,
}

/// A row as posted by the editable grid, before coercion
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct GridRow {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub date: Value,
    #[serde(default)]
    pub concept: Value,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub kind: Value,
    #[serde(default)]
    pub category: Value,
    #[serde(default)]
    pub payment_method: Value,
    #[serde(default)]
    pub responsible: Value,
}

impl Ledger {
    pub fn new(entries: Vec<Entry>) -> Self {
        Ledger { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a ledger from a raw worksheet.
    ///
    /// Missing columns read as empty, amounts that fail to coerce become
    /// `0.0`, and rows with every cell blank are skipped. Never fails.
    pub fn from_table(table: &Table) -> Self {
        let index: HashMap<&str, Option<usize>> = COLUMNS
            .iter()
            .map(|name| (*name, table.column_index(name)))
            .collect();

        let missing: Vec<&str> = COLUMNS
            .iter()
            .filter(|name| index[*name].is_none())
            .copied()
            .collect();
        if !missing.is_empty() && !table.headers.is_empty() {
            debug!("Worksheet is missing columns {:?}; reading them as empty", missing);
        }

        let mut entries = Vec::with_capacity(table.rows.len());
        for (r, row) in table.rows.iter().enumerate() {
            if row.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let get = |name: &str| -> &str {
                match index[name] {
                    Some(c) => table.cell(r, c),
                    None => "",
                }
            };

            entries.push(Entry {
                id: parse_id(get(COL_ID)),
                date: parse_date(get(COL_DATE)),
                concept: parse_text(get(COL_CONCEPT)).unwrap_or_default(),
                amount: parse_amount(get(COL_AMOUNT)).unwrap_or(0.0),
                kind: parse_kind(get(COL_KIND)),
                category: parse_category(get(COL_CATEGORY)),
                payment_method: parse_text(get(COL_PAYMENT_METHOD)),
                responsible: parse_text(get(COL_RESPONSIBLE)),
            });
        }

        Ledger { entries }
    }

    /// Worksheet shape used when saving: fixed columns, ISO dates.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(COLUMNS.iter().map(|c| c.to_string()).collect());
        for entry in &self.entries {
            table.push_row(vec![
                entry.id.map(|id| id.to_string()).unwrap_or_default(),
                entry
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                entry.concept.clone(),
                format_amount(entry.amount),
                entry.kind.map(|k| k.label().to_string()).unwrap_or_default(),
                entry.category.clone().unwrap_or_default(),
                entry.payment_method.clone().unwrap_or_default(),
                entry.responsible.clone().unwrap_or_default(),
            ]);
        }
        table
    }

    /// Re-validates grid rows into a ledger ready to be written.
    ///
    /// Rows lacking a date or an amount are dropped. Surviving rows keep
    /// their id when it is unique; the rest get fresh consecutive ids.
    pub fn from_grid(rows: &[GridRow]) -> (Self, SaveReport) {
        let mut entries = Vec::with_capacity(rows.len());
        let mut dropped = 0;

        for row in rows {
            let (Some(date), Some(amount)) = (date_from_json(&row.date), amount_from_json(&row.amount))
            else {
                dropped += 1;
                continue;
            };
            entries.push(Entry {
                id: id_from_json(&row.id),
                date: Some(date),
                concept: text_from_json(&row.concept).unwrap_or_default(),
                amount,
                kind: kind_from_json(&row.kind),
                category: text_from_json(&row.category).and_then(|c| canonical_category(&c)),
                payment_method: text_from_json(&row.payment_method),
                responsible: text_from_json(&row.responsible),
            });
        }

        let mut ledger = Ledger { entries };
        let assigned_ids = ledger.assign_ids();
        let report = SaveReport {
            kept: ledger.len(),
            dropped,
            assigned_ids,
        };
        if dropped > 0 {
            info!("Dropped {} incomplete rows (missing date or amount)", dropped);
        }
        (ledger, report)
    }

    /// Next free identifier: one past the largest in use, or 1.
    pub fn next_id(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|e| e.id)
            .max()
            .map_or(Some(1), |max| max.checked_add(1))
            .unwrap_or_else(|| {
                let used: HashSet<u64> = self.entries.iter().filter_map(|e| e.id).collect();
                smallest_unused(&used, 1)
            })
    }

    /// Gives every row without a unique id a fresh one.
    ///
    /// The first row holding a given id keeps it; later duplicates and rows
    /// with no id are numbered from one past the largest kept id, in row
    /// order. Returns the ids handed out.
    pub fn assign_ids(&mut self) -> Vec<u64> {
        let mut seen = HashSet::new();
        let mut needs_id = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            match entry.id {
                Some(id) if seen.insert(id) => {}
                _ => needs_id.push(i),
            }
        }

        // Counting up from the largest id; once that runs out, fill gaps from 1
        let mut upper = seen.iter().max().map_or(Some(1), |max| max.checked_add(1));
        let mut lower = 1;
        let mut assigned = Vec::with_capacity(needs_id.len());
        for i in needs_id {
            let id = match upper {
                Some(id) => {
                    upper = id.checked_add(1);
                    id
                }
                None => {
                    lower = smallest_unused(&seen, lower);
                    lower
                }
            };
            seen.insert(id);
            self.entries[i].id = Some(id);
            assigned.push(id);
        }
        assigned
    }

    /// Appends an entry, numbering it when it carries no id.
    pub fn add(&mut self, mut entry: Entry) -> u64 {
        let id = match entry.id {
            Some(id) if !self.entries.iter().any(|e| e.id == Some(id)) => id,
            _ => self.next_id(),
        };
        entry.id = Some(id);
        self.entries.push(entry);
        id
    }

    fn dated(&self) -> impl Iterator<Item = (&Entry, NaiveDate)> {
        self.entries.iter().filter_map(|e| e.date.map(|d| (e, d)))
    }

    /// Entries dated inside the given month. Undated entries are left out.
    pub fn filter_month(&self, year: i32, month: u32) -> Ledger {
        let entries = self
            .dated()
            .filter(|(_, d)| d.year() == year && d.month() == month)
            .map(|(e, _)| e.clone())
            .collect();
        Ledger { entries }
    }

    /// Credits minus expenses over every entry dated before `day`.
    pub fn net_before(&self, day: NaiveDate) -> f64 {
        self.dated()
            .filter(|(_, d)| *d < day)
            .map(|(e, _)| e.signed_amount())
            .sum()
    }

    pub fn totals(&self, base: f64) -> Totals {
        let mut spent = 0.0;
        let mut credited = 0.0;
        for (entry, _) in self.dated() {
            if entry.is_expense() {
                spent += entry.amount;
            } else if entry.is_credit() {
                credited += entry.amount;
            }
        }
        Totals {
            base,
            spent,
            credited,
            available: base - spent + credited,
        }
    }

    /// Credits minus expenses per day, oldest first.
    pub fn daily_net(&self) -> Vec<(NaiveDate, f64)> {
        let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (entry, date) in self.dated() {
            *days.entry(date).or_insert(0.0) += entry.signed_amount();
        }
        days.into_iter().collect()
    }

    /// Running balance: `base` plus the cumulative daily net.
    pub fn projected_balance(&self, base: f64) -> Vec<BalancePoint> {
        let mut balance = base;
        self.daily_net()
            .into_iter()
            .map(|(date, net)| {
                balance += net;
                BalancePoint { date, net, balance }
            })
            .collect()
    }

    pub fn category_breakdown(&self) -> Vec<Breakdown> {
        self.expense_breakdown(|e| e.category.as_deref().unwrap_or(NO_CATEGORY))
    }

    pub fn payer_breakdown(&self) -> Vec<Breakdown> {
        self.expense_breakdown(|e| e.responsible.as_deref().unwrap_or(NO_RESPONSIBLE))
    }

    fn expense_breakdown<F>(&self, label: F) -> Vec<Breakdown>
    where
        F: Fn(&Entry) -> &str,
    {
        let mut sums: HashMap<String, f64> = HashMap::new();
        for (entry, _) in self.dated().filter(|(e, _)| e.is_expense()) {
            *sums.entry(label(entry).to_string()).or_insert(0.0) += entry.amount;
        }

        let mut items: Vec<Breakdown> = sums
            .into_iter()
            .map(|(label, amount)| Breakdown { label, amount })
            .collect();
        items.sort_by(|a, b| {
            b.amount
                .total_cmp(&a.amount)
                .then_with(|| a.label.cmp(&b.label))
        });
        items
    }
}

fn smallest_unused(used: &HashSet<u64>, from: u64) -> u64 {
    (from..).find(|id| !used.contains(id)).unwrap_or(from)
}

/// Formats an amount for the worksheet: at most two decimals, no noise.
pub fn format_amount(amount: f64) -> String {
    let scaled = (amount * 100.0).round();
    if !scaled.is_finite() {
        // Too large for cents to matter; plain digits still parse back
        return amount.to_string();
    }
    // `+ 0.0` turns a negative zero into a positive one
    let rounded = scaled / 100.0 + 0.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').to_string()
    }
}
