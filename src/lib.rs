/*!
# Bitácora

A household expense ledger with a browser dashboard, built in Rust.

## Overview

Two people share one pot of money. Every movement is a row of the ledger
(date, concept, amount, type, category, payment method, responsible party)
kept in a spreadsheet-shaped store. The dashboard shows the rows in an
editable grid, the running totals, and three charts: the projected balance
trajectory, spending per category and spending per person.

## Data flow

- Read the movements worksheet and the `Config` worksheet (base balance)
- Coerce every loosely-typed cell into dates and numbers
- Serve the editable grid and the summary
- On save: re-validate, drop incomplete rows, number new rows, overwrite the
  worksheet, clear the cache, reload

## Balance

`available = base - spent + credited`. The projected balance is the base
balance plus the cumulative daily net (credits minus expenses), one point
per day with movements.

## Modules

- **entry**: Ledger row type, entry kinds, column names and category options
- **coerce**: Defensive parsing of dates, amounts, ids and text cells
- **ledger**: Cleaning, id assignment, totals, balance and breakdowns
- **store**: Worksheet store trait and the CSV workbook implementation
- **cache**: Time-bounded cache of the last loaded ledger
- **service**: Read-clean-write cycle shared by the server and the CLI
- **saving**: Compressed snapshot backups
- **downloader**: CSV and XLSX exports
- **graph**: PNG charts (web feature)
- **app**: Routing and handlers (web feature)

## REST API Endpoints

- `GET /api/ledger` - Rows and option lists for the grid
- `POST /api/ledger` - Save the edited grid
- `GET /api/summary?month=YYYY-MM` - Totals, balance trajectory, breakdowns
- `GET|POST /api/base_balance` - Read or overwrite the base balance
- `GET /api/charts/{balance|categories|payers}` - PNG charts
- `GET /api/export?format=csv|xlsx` - Download the ledger
- `GET /api/backup`, `POST /api/restore` - Snapshot backups
*/

pub mod cache;
pub mod coerce;
pub mod config;
pub mod downloader;
pub mod entry;
pub mod error;
pub mod ledger;
pub mod saving;
pub mod service;
pub mod store;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;

pub use entry::{Entry, EntryKind};
pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use service::LedgerService;
pub use store::{CsvWorkbook, SheetStore, Table};
