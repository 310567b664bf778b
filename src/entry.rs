use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column headers of the ledger worksheet, in the order rows are saved
pub const COLUMNS: [&str; 8] = [
    COL_ID,
    COL_DATE,
    COL_CONCEPT,
    COL_AMOUNT,
    COL_KIND,
    COL_CATEGORY,
    COL_PAYMENT_METHOD,
    COL_RESPONSIBLE,
];

pub const COL_ID: &str = "ID";
pub const COL_DATE: &str = "Fecha";
pub const COL_CONCEPT: &str = "Concepto";
pub const COL_AMOUNT: &str = "Monto";
pub const COL_KIND: &str = "Tipo";
pub const COL_CATEGORY: &str = "Categoria";
pub const COL_PAYMENT_METHOD: &str = "Metodo_Pago";
pub const COL_RESPONSIBLE: &str = "Responsable";

/// Category options offered by the editable grid
pub const CATEGORIES: [&str; 8] = [
    "Super",
    "Software/Suscripciones",
    "Alimentos/Restaurantes",
    "Servicios",
    "Viajes",
    "Salud",
    "Transporte",
    "Otros",
];

/// Direction of a ledger entry
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Money leaving the household funds
    #[serde(rename = "Gasto")]
    Expense,
    /// Money coming back in
    #[serde(rename = "Abono")]
    Credit,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Expense => "Gasto",
            EntryKind::Credit => "Abono",
        }
    }

    /// Lenient label parsing; returns `None` for anything unrecognised.
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "gasto" | "expense" | "debit" | "cargo" => Some(EntryKind::Expense),
            "abono" | "credit" | "ingreso" | "deposito" | "depósito" => Some(EntryKind::Credit),
            _ => None,
        }
    }

    pub fn all() -> [EntryKind; 2] {
        [EntryKind::Expense, EntryKind::Credit]
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One transaction of the ledger
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Entry {
    pub id: Option<u64>,
    pub date: Option<NaiveDate>,
    pub concept: String,
    pub amount: f64,
    pub kind: Option<EntryKind>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub responsible: Option<String>,
}

impl Entry {
    pub fn new(date: NaiveDate, concept: &str, amount: f64, kind: EntryKind) -> Self {
        Entry {
            id: None,
            date: Some(date),
            concept: concept.to_string(),
            amount,
            kind: Some(kind),
            category: None,
            payment_method: None,
            responsible: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = canonical_category(category);
        self
    }

    pub fn with_payment_method(mut self, method: &str) -> Self {
        self.payment_method = Some(method.trim().to_string()).filter(|m| !m.is_empty());
        self
    }

    pub fn with_responsible(mut self, who: &str) -> Self {
        self.responsible = Some(who.trim().to_string()).filter(|w| !w.is_empty());
        self
    }

    /// Effect of this entry on the balance. Untyped rows do not move it.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            Some(EntryKind::Credit) => self.amount,
            Some(EntryKind::Expense) => -self.amount,
            None => 0.0,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.kind == Some(EntryKind::Expense)
    }

    pub fn is_credit(&self) -> bool {
        self.kind == Some(EntryKind::Credit)
    }
}

/// Maps a category onto the known spelling when it matches one, otherwise
/// keeps it as typed. Blank input yields `None`.
pub fn canonical_category(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let known = CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(trimmed))
        .map(|c| c.to_string());
    Some(known.unwrap_or_else(|| trimmed.to_string()))
}
