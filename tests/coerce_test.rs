use bitacora::coerce::{
    MAX_ID, amount_from_json, date_from_json, date_from_serial, id_from_json, normalize_header,
    parse_amount, parse_category, parse_date, parse_id, parse_kind, parse_text,
};
use bitacora::entry::EntryKind;
use chrono::NaiveDate;
use serde_json::json;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn headers_lose_whitespace_and_bom() {
    assert_eq!(normalize_header("  Fecha "), "Fecha");
    assert_eq!(normalize_header("\u{feff}ID"), "ID");
}

#[test]
fn dates_in_common_spreadsheet_shapes() {
    assert_eq!(parse_date("2024-03-05"), Some(ymd(2024, 3, 5)));
    assert_eq!(parse_date(" 2024/03/05 "), Some(ymd(2024, 3, 5)));
    assert_eq!(parse_date("2024-03-05 00:00:00"), Some(ymd(2024, 3, 5)));
    assert_eq!(parse_date("2024-03-05T18:30:00"), Some(ymd(2024, 3, 5)));
    assert_eq!(parse_date("2024-03-05T18:30:00Z"), Some(ymd(2024, 3, 5)));
    assert_eq!(parse_date("20240305"), Some(ymd(2024, 3, 5)));
}

#[test]
fn ambiguous_dates_are_day_first() {
    assert_eq!(parse_date("03/04/2024"), Some(ymd(2024, 4, 3)));
    assert_eq!(parse_date("03-04-2024"), Some(ymd(2024, 4, 3)));
    assert_eq!(parse_date("03/04/24"), Some(ymd(2024, 4, 3)));
    assert_eq!(parse_date("31/12/2023"), Some(ymd(2023, 12, 31)));
}

#[test]
fn serial_day_numbers() {
    assert_eq!(date_from_serial(45000.0), Some(ymd(2023, 3, 15)));
    assert_eq!(parse_date("45000"), Some(ymd(2023, 3, 15)));
    assert_eq!(parse_date("45000.75"), Some(ymd(2023, 3, 15)));
    assert_eq!(date_from_serial(0.0), None);
    assert_eq!(date_from_serial(-3.0), None);
    assert_eq!(date_from_serial(f64::NAN), None);
}

#[test]
fn unusable_dates_become_none() {
    for raw in ["", "   ", "NaT", "nan", "None", "mañana", "2024-13-01", "31/02/2024"] {
        assert_eq!(parse_date(raw), None, "{:?}", raw);
    }
}

#[test]
fn amounts_with_currency_and_separators() {
    assert_eq!(parse_amount("150"), Some(150.0));
    assert_eq!(parse_amount(" $1,234.50 "), Some(1234.5));
    assert_eq!(parse_amount("1.234,50"), Some(1234.5));
    assert_eq!(parse_amount("12,5"), Some(12.5));
    assert_eq!(parse_amount("1,234"), Some(1234.0));
    assert_eq!(parse_amount("1,234,567"), Some(1234567.0));
    assert_eq!(parse_amount("1.234.567"), Some(1234567.0));
    assert_eq!(parse_amount("MXN 99.90"), Some(99.9));
    assert_eq!(parse_amount("-20"), Some(-20.0));
    assert_eq!(parse_amount("(20.00)"), Some(-20.0));
    assert_eq!(parse_amount("20-"), Some(-20.0));
    assert_eq!(parse_amount("1e3"), Some(1000.0));
}

#[test]
fn unusable_amounts_become_none() {
    for raw in ["", "nan", "abc", "12abc", "-", "inf", "NaN", "$", "-5-", "+5-", "(5)-", "--5"] {
        assert_eq!(parse_amount(raw), None, "{:?}", raw);
    }
}

#[test]
fn ids_accept_integral_floats_only() {
    assert_eq!(parse_id("7"), Some(7));
    assert_eq!(parse_id("7.0"), Some(7));
    assert_eq!(parse_id(" 12 "), Some(12));
    assert_eq!(parse_id("7.5"), None);
    assert_eq!(parse_id("-1"), None);
    assert_eq!(parse_id("nan"), None);
    assert_eq!(parse_id(""), None);
}

#[test]
fn ids_stop_at_the_largest_exact_json_integer() {
    assert_eq!(parse_id("9007199254740992"), Some(MAX_ID));
    assert_eq!(parse_id("9007199254740993"), None);
    assert_eq!(parse_id("18446744073709551615"), None);
    assert_eq!(id_from_json(&json!(u64::MAX)), None);
    assert_eq!(id_from_json(&json!(MAX_ID)), Some(MAX_ID));
}

#[test]
fn kinds_are_lenient() {
    assert_eq!(parse_kind("Gasto"), Some(EntryKind::Expense));
    assert_eq!(parse_kind(" gasto "), Some(EntryKind::Expense));
    assert_eq!(parse_kind("ABONO"), Some(EntryKind::Credit));
    assert_eq!(parse_kind("Ingreso"), Some(EntryKind::Credit));
    assert_eq!(parse_kind("Transferencia"), None);
    assert_eq!(parse_kind(""), None);
}

#[test]
fn text_and_categories() {
    assert_eq!(parse_text("  Tacos  "), Some("Tacos".to_string()));
    assert_eq!(parse_text("nan"), None);
    assert_eq!(parse_category("super"), Some("Super".to_string()));
    assert_eq!(parse_category("SALUD"), Some("Salud".to_string()));
    assert_eq!(parse_category("Mascotas"), Some("Mascotas".to_string()));
    assert_eq!(parse_category(" "), None);
}

#[test]
fn json_cells_from_the_grid() {
    assert_eq!(date_from_json(&json!("2024-01-02")), Some(ymd(2024, 1, 2)));
    assert_eq!(date_from_json(&json!(null)), None);
    assert_eq!(amount_from_json(&json!(12.5)), Some(12.5));
    assert_eq!(amount_from_json(&json!("$3,000")), Some(3000.0));
    assert_eq!(amount_from_json(&json!(null)), None);
    assert_eq!(amount_from_json(&json!(true)), None);
    assert_eq!(id_from_json(&json!(4)), Some(4));
    assert_eq!(id_from_json(&json!(4.0)), Some(4));
    assert_eq!(id_from_json(&json!("")), None);
}
