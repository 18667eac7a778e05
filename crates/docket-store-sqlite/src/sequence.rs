//! Atomic reference-number minting.
//!
//! A single upsert both reads and bumps the counter, so two writers can never
//! observe the same value. Callers run it inside the transaction that inserts
//! the row, so a failed insert also releases the number.

use docket_core::reference::{EntryKind, ReferenceNo};
use rusqlite::Connection;

use crate::encode::encode_kind;

/// Mint the next reference number for `kind` in `year`.
pub fn next_reference(
  conn: &Connection,
  kind: EntryKind,
  year: i32,
) -> rusqlite::Result<ReferenceNo> {
  let seq: u32 = conn.query_row(
    "INSERT INTO sequences (kind, year, last_seq) VALUES (?1, ?2, 1)
     ON CONFLICT (kind, year) DO UPDATE SET last_seq = last_seq + 1
     RETURNING last_seq",
    rusqlite::params![encode_kind(kind), year],
    |row| row.get(0),
  )?;
  Ok(ReferenceNo::new(kind, year, seq))
}
