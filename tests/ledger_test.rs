use bitacora::coerce::parse_amount;
use bitacora::entry::{COLUMNS, Entry, EntryKind};
use bitacora::ledger::{GridRow, Ledger, NO_CATEGORY, NO_RESPONSIBLE, format_amount};
use bitacora::store::Table;
use chrono::NaiveDate;
use serde_json::json;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
    Table {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    }
}

fn sample() -> Ledger {
    let mut ledger = Ledger::default();
    ledger.add(
        Entry::new(ymd(2024, 1, 1), "Super semanal", 500.0, EntryKind::Expense)
            .with_category("Super")
            .with_responsible("Ana"),
    );
    ledger.add(
        Entry::new(ymd(2024, 1, 1), "Reembolso", 100.0, EntryKind::Credit).with_responsible("Luis"),
    );
    ledger.add(
        Entry::new(ymd(2024, 1, 3), "Tacos", 250.0, EntryKind::Expense)
            .with_category("Alimentos/Restaurantes")
            .with_responsible("Luis"),
    );
    ledger.add(Entry::new(ymd(2024, 2, 10), "Farmacia", 80.0, EntryKind::Expense));
    ledger
}

#[test]
fn from_table_coerces_every_column() {
    let t = table(
        &COLUMNS,
        &[&["3", "05/01/2024", "Gasolina", "$1,200.00", "Gasto", "transporte", "Tarjeta", "Ana"]],
    );
    let ledger = Ledger::from_table(&t);
    assert_eq!(ledger.len(), 1);

    let e = &ledger.entries[0];
    assert_eq!(e.id, Some(3));
    assert_eq!(e.date, Some(ymd(2024, 1, 5)));
    assert_eq!(e.concept, "Gasolina");
    assert_eq!(e.amount, 1200.0);
    assert_eq!(e.kind, Some(EntryKind::Expense));
    assert_eq!(e.category.as_deref(), Some("Transporte"));
    assert_eq!(e.payment_method.as_deref(), Some("Tarjeta"));
    assert_eq!(e.responsible.as_deref(), Some("Ana"));
}

#[test]
fn from_table_tolerates_missing_columns_and_bad_cells() {
    let t = table(
        &[" Fecha ", "Monto", "Tipo", "Extra"],
        &[
            &["2024-01-01", "abc", "Gasto", "x"],
            &["nope", "50", "Abono", ""],
            &["", "", "", ""],
        ],
    );
    let ledger = Ledger::from_table(&t);

    // The fully blank row is skipped
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.entries[0].amount, 0.0);
    assert_eq!(ledger.entries[0].id, None);
    assert_eq!(ledger.entries[0].concept, "");
    assert_eq!(ledger.entries[1].date, None);
    assert_eq!(ledger.entries[1].amount, 50.0);
}

#[test]
fn to_table_uses_fixed_columns_and_iso_dates() {
    let ledger = sample();
    let t = ledger.to_table();

    assert_eq!(t.headers, COLUMNS.to_vec());
    assert_eq!(t.rows.len(), 4);
    assert_eq!(
        t.rows[0],
        vec!["1", "2024-01-01", "Super semanal", "500", "Gasto", "Super", "", "Ana"]
    );

    let reread = Ledger::from_table(&t);
    assert_eq!(reread, ledger);
}

#[test]
fn amounts_are_written_without_noise() {
    assert_eq!(format_amount(500.0), "500");
    assert_eq!(format_amount(12.5), "12.5");
    assert_eq!(format_amount(12.346), "12.35");
    assert_eq!(format_amount(-3.1), "-3.1");
    assert_eq!(format_amount(-0.001), "0");
    assert_eq!(format_amount(-0.0), "0");
}

#[test]
fn huge_amounts_survive_the_worksheet() {
    let amount = parse_amount("1e307").unwrap();
    let written = format_amount(amount);
    assert_ne!(written, "inf");
    assert_eq!(parse_amount(&written), Some(amount));

    let mut ledger = Ledger::default();
    ledger.add(Entry::new(ymd(2024, 1, 1), "Herencia", amount, EntryKind::Credit));
    let reread = Ledger::from_table(&ledger.to_table());
    assert_eq!(reread.entries[0].amount, amount);
}

#[test]
fn totals_follow_base_minus_spent_plus_credited() {
    let totals = sample().totals(20000.0);
    assert_eq!(totals.base, 20000.0);
    assert_eq!(totals.spent, 830.0);
    assert_eq!(totals.credited, 100.0);
    assert_eq!(totals.available, 20000.0 - 830.0 + 100.0);
}

#[test]
fn undated_and_untyped_rows_do_not_count() {
    let mut ledger = sample();
    let mut undated = Entry::new(ymd(2024, 1, 2), "Sin fecha", 999.0, EntryKind::Expense);
    undated.date = None;
    ledger.add(undated);
    let mut untyped = Entry::new(ymd(2024, 1, 2), "Sin tipo", 999.0, EntryKind::Expense);
    untyped.kind = None;
    ledger.add(untyped);

    let totals = ledger.totals(0.0);
    assert_eq!(totals.spent, 830.0);
    assert_eq!(totals.credited, 100.0);

    let net: Vec<_> = ledger.daily_net();
    assert_eq!(net[1], (ymd(2024, 1, 2), 0.0));
}

#[test]
fn projected_balance_is_cumulative_daily_net() {
    let points = sample().projected_balance(1000.0);
    let view: Vec<(NaiveDate, f64, f64)> =
        points.iter().map(|p| (p.date, p.net, p.balance)).collect();

    assert_eq!(
        view,
        vec![
            (ymd(2024, 1, 1), -400.0, 600.0),
            (ymd(2024, 1, 3), -250.0, 350.0),
            (ymd(2024, 2, 10), -80.0, 270.0),
        ]
    );
    // Last point agrees with the headline figure
    assert_eq!(points.last().unwrap().balance, sample().totals(1000.0).available);
}

#[test]
fn projected_balance_sorts_out_of_order_rows() {
    let mut ledger = Ledger::default();
    ledger.add(Entry::new(ymd(2024, 5, 2), "b", 10.0, EntryKind::Credit));
    ledger.add(Entry::new(ymd(2024, 5, 1), "a", 30.0, EntryKind::Expense));

    let points = ledger.projected_balance(100.0);
    assert_eq!(points[0].date, ymd(2024, 5, 1));
    assert_eq!(points[0].balance, 70.0);
    assert_eq!(points[1].balance, 80.0);
}

#[test]
fn empty_ledger_has_no_trajectory() {
    let ledger = Ledger::default();
    assert!(ledger.projected_balance(20000.0).is_empty());
    assert_eq!(ledger.totals(20000.0).available, 20000.0);
    assert!(ledger.category_breakdown().is_empty());
}

#[test]
fn breakdowns_sum_expenses_by_label() {
    let ledger = sample();

    let categories = ledger.category_breakdown();
    let labels: Vec<(&str, f64)> = categories
        .iter()
        .map(|b| (b.label.as_str(), b.amount))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("Super", 500.0),
            ("Alimentos/Restaurantes", 250.0),
            (NO_CATEGORY, 80.0)
        ]
    );

    let payers = ledger.payer_breakdown();
    let labels: Vec<(&str, f64)> = payers.iter().map(|b| (b.label.as_str(), b.amount)).collect();
    // Luis' credit is not spending
    assert_eq!(
        labels,
        vec![("Ana", 500.0), ("Luis", 250.0), (NO_RESPONSIBLE, 80.0)]
    );
}

#[test]
fn filter_month_keeps_only_that_month() {
    let january = sample().filter_month(2024, 1);
    assert_eq!(january.len(), 3);
    assert_eq!(january.totals(0.0).spent, 750.0);
    assert!(sample().filter_month(2023, 1).is_empty());
}

#[test]
fn next_id_is_one_past_the_largest() {
    assert_eq!(Ledger::default().next_id(), 1);
    let mut ledger = sample();
    assert_eq!(ledger.next_id(), 5);
    ledger.entries[0].id = Some(40);
    assert_eq!(ledger.next_id(), 41);
}

#[test]
fn add_keeps_unique_ids_and_replaces_taken_ones() {
    let mut ledger = sample();
    let mut with_id = Entry::new(ymd(2024, 3, 1), "x", 1.0, EntryKind::Expense);
    with_id.id = Some(10);
    assert_eq!(ledger.add(with_id.clone()), 10);
    // 10 is now taken
    assert_eq!(ledger.add(with_id), 11);
}

#[test]
fn assign_ids_fills_gaps_and_duplicates_in_row_order() {
    let mut ledger = Ledger::new(vec![
        Entry::new(ymd(2024, 1, 1), "a", 1.0, EntryKind::Expense),
        Entry::new(ymd(2024, 1, 1), "b", 1.0, EntryKind::Expense),
        Entry::new(ymd(2024, 1, 1), "c", 1.0, EntryKind::Expense),
        Entry::new(ymd(2024, 1, 1), "d", 1.0, EntryKind::Expense),
    ]);
    ledger.entries[1].id = Some(7);
    ledger.entries[3].id = Some(7);

    let assigned = ledger.assign_ids();
    assert_eq!(assigned, vec![8, 9, 10]);
    let ids: Vec<Option<u64>> = ledger.entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![Some(8), Some(7), Some(9), Some(10)]);
}

#[test]
fn grid_rows_without_date_or_amount_are_dropped() {
    let rows: Vec<GridRow> = serde_json::from_value(json!([
        { "id": 1, "date": "2024-01-05", "concept": "Luz", "amount": 350, "kind": "Gasto", "category": "servicios" },
        { "id": null, "date": "2024-01-06", "concept": "Nuevo", "amount": "1,000", "kind": "Abono" },
        { "id": 2, "date": null, "concept": "Sin fecha", "amount": 10 },
        { "date": "2024-01-07", "concept": "Sin monto", "amount": "" },
        { "id": 1, "date": "07/01/2024", "amount": 5, "kind": "Gasto" }
    ]))
    .unwrap();

    let (ledger, report) = Ledger::from_grid(&rows);
    assert_eq!(report.kept, 3);
    assert_eq!(report.dropped, 2);
    assert_eq!(report.assigned_ids, vec![2, 3]);

    assert_eq!(ledger.entries[0].id, Some(1));
    assert_eq!(ledger.entries[0].category.as_deref(), Some("Servicios"));
    assert_eq!(ledger.entries[1].id, Some(2));
    assert_eq!(ledger.entries[1].amount, 1000.0);
    assert_eq!(ledger.entries[1].kind, Some(EntryKind::Credit));
    // Duplicate id 1 renumbered, day-first date
    assert_eq!(ledger.entries[2].id, Some(3));
    assert_eq!(ledger.entries[2].date, Some(ymd(2024, 1, 7)));
}

#[test]
fn ids_past_the_json_range_are_not_kept() {
    let rows: Vec<GridRow> = serde_json::from_value(json!([
        { "id": "18446744073709551615", "date": "2024-01-05", "amount": 1 },
        { "date": "2024-01-06", "amount": 2 },
        { "date": "2024-01-07", "amount": 3 }
    ]))
    .unwrap();

    let (ledger, report) = Ledger::from_grid(&rows);
    assert_eq!(report.assigned_ids, vec![1, 2, 3]);
    let ids: Vec<Option<u64>> = ledger.entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn fresh_ids_stay_unique_at_the_top_of_the_range() {
    let mut ledger = Ledger::new(vec![
        Entry::new(ymd(2024, 1, 1), "a", 1.0, EntryKind::Expense),
        Entry::new(ymd(2024, 1, 1), "b", 1.0, EntryKind::Expense),
        Entry::new(ymd(2024, 1, 1), "c", 1.0, EntryKind::Expense),
    ]);
    ledger.entries[0].id = Some(u64::MAX);
    ledger.entries[1].id = Some(1);

    assert_eq!(ledger.next_id(), 2);
    assert_eq!(ledger.assign_ids(), vec![2]);
    assert_eq!(ledger.next_id(), 3);
    assert_eq!(ledger.add(Entry::new(ymd(2024, 1, 2), "d", 1.0, EntryKind::Expense)), 3);
}

#[test]
fn net_before_sums_earlier_days_only() {
    let ledger = sample();
    assert_eq!(ledger.net_before(ymd(2024, 1, 1)), 0.0);
    assert_eq!(ledger.net_before(ymd(2024, 2, 1)), -650.0);
}
