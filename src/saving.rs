use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};

use crate::error::Result;
use crate::ledger::Ledger;

/// Everything needed to restore the dashboard: entries and base balance
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct LedgerBackup {
    pub ledger: Ledger,
    pub base_balance: f64,
}

pub fn save_snapshot(backup: &LedgerBackup, filename: &str) -> Result<()> {
    let file = File::create(filename)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, backup)?;
    writer.flush()?;

    Ok(())
}

pub fn load_snapshot(filename: &str) -> Result<LedgerBackup> {
    let file = File::open(filename)?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let backup: LedgerBackup = deserialize_from(&mut reader)?;

    Ok(backup)
}

pub fn snapshot_to_bytes(backup: &LedgerBackup) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    serialize_into(&mut encoder, backup)?;
    Ok(encoder.finish()?)
}

pub fn snapshot_from_bytes(buffer: &[u8]) -> Result<LedgerBackup> {
    let decoder = GzDecoder::new(Cursor::new(buffer));
    let mut reader = BufReader::new(decoder);

    let backup: LedgerBackup = deserialize_from(&mut reader)?;

    Ok(backup)
}
