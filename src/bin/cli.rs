#![cfg(not(tarpaulin_include))]

use bitacora::coerce::{parse_amount, parse_date, parse_kind};
use bitacora::config::AppConfig;
use bitacora::entry::Entry;
use bitacora::service::{LedgerService, summarize};
use bitacora::store::CsvWorkbook;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

fn print_ledger(service: &LedgerService) -> bitacora::Result<()> {
    let snapshot = service.snapshot()?;
    println!(
        "{:>4}  {:<10}  {:<28}  {:>12}  {:<6}  {:<22}  {:<12}",
        "ID", "Fecha", "Concepto", "Monto", "Tipo", "Categoria", "Responsable"
    );
    for e in &snapshot.ledger.entries {
        println!(
            "{:>4}  {:<10}  {:<28}  {:>12.2}  {:<6}  {:<22}  {:<12}",
            e.id.map(|id| id.to_string()).unwrap_or_default(),
            e.date.map(|d| d.to_string()).unwrap_or_default(),
            e.concept.chars().take(28).collect::<String>(),
            e.amount,
            e.kind.map(|k| k.label()).unwrap_or(""),
            e.category.as_deref().unwrap_or(""),
            e.responsible.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn print_summary(service: &LedgerService) -> bitacora::Result<()> {
    let snapshot = service.snapshot()?;
    let summary = summarize(&snapshot.ledger, snapshot.base_balance);
    if !summary.has_data {
        println!("No dated movements yet");
        return Ok(());
    }
    println!("Base:       {:>12.2}", summary.totals.base);
    println!("Spent:      {:>12.2}", summary.totals.spent);
    println!("Credited:   {:>12.2}", summary.totals.credited);
    println!("Available:  {:>12.2}", summary.totals.available);
    println!();
    for point in &summary.balance {
        println!("  {}  {:>+12.2}  {:>12.2}", point.date, point.net, point.balance);
    }
    println!();
    for item in &summary.categories {
        println!("  {:<24} {:>12.2}", item.label, item.amount);
    }
    Ok(())
}

// fecha;concepto;monto;tipo[;categoria;metodo;responsable]
fn parse_add(args: &str) -> Option<Entry> {
    let parts: Vec<&str> = args.split(';').map(|p| p.trim()).collect();
    if parts.len() < 4 {
        return None;
    }
    let date = parse_date(parts[0])?;
    let amount = parse_amount(parts[2])?;
    let kind = parse_kind(parts[3])?;

    let mut entry = Entry::new(date, parts[1], amount, kind);
    if let Some(category) = parts.get(4) {
        entry = entry.with_category(category);
    }
    if let Some(method) = parts.get(5) {
        entry = entry.with_payment_method(method);
    }
    if let Some(who) = parts.get(6) {
        entry = entry.with_responsible(who);
    }
    Some(entry)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = AppConfig::from_env();
    let store = CsvWorkbook::open(&config.data_dir)?;
    let service = LedgerService::new(Arc::new(store), config);

    let mut status = String::from("ok");
    let mut start_time = Instant::now();
    loop {
        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();

        let (name, args) = command.split_once(' ').unwrap_or((command, ""));
        let result = match name {
            "" => {
                status = String::from("invalid command");
                continue;
            }
            "q" => break,
            "help" => {
                println!("Commands:");
                println!("  list: Show every movement");
                println!("  add <fecha>;<concepto>;<monto>;<tipo>[;categoria;metodo;responsable]");
                println!("  summary: Totals, balance per day and spending per category");
                println!("  base <n>: Set the base balance");
                println!("  q: Quit");
                Ok(())
            }
            "list" => print_ledger(&service),
            "summary" => print_summary(&service),
            "base" => match parse_amount(args) {
                Some(value) => service.set_base_balance(value.round() as i64),
                None => {
                    status = String::from("invalid amount");
                    continue;
                }
            },
            "add" => match parse_add(args) {
                Some(entry) => service.snapshot().and_then(|snapshot| {
                    let mut ledger = snapshot.ledger.clone();
                    let id = ledger.add(entry);
                    println!("Added movement {}", id);
                    service.save_ledger(&ledger)
                }),
                None => {
                    status = String::from("invalid movement");
                    continue;
                }
            },
            _ => {
                status = String::from("invalid command");
                continue;
            }
        };

        status = match result {
            Ok(()) => String::from("ok"),
            Err(e) => e.to_string(),
        };
    }

    Ok(())
}
