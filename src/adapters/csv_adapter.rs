//! CSV export of transaction history.

use std::io::Write;

use crate::domain::error::TraderError;
use crate::domain::ledger::{Transaction, TIMESTAMP_FORMAT};

const HEADER: [&str; 5] = ["symbol", "shares", "price", "total", "executed_at"];

/// Write `history` as CSV with a header row. `total` is the signed cash
/// movement of each row, negative for buys.
pub fn write_history<W: Write>(writer: W, history: &[Transaction]) -> Result<(), TraderError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER).map_err(csv_error)?;

    for tx in history {
        wtr.write_record([
            tx.symbol.clone(),
            tx.shares.to_string(),
            tx.price.to_string(),
            tx.cash_delta().to_string(),
            tx.executed_at.format(TIMESTAMP_FORMAT).to_string(),
        ])
        .map_err(csv_error)?;
    }

    wtr.flush()?;
    Ok(())
}

fn csv_error(e: csv::Error) -> TraderError {
    TraderError::Io(std::io::Error::other(format!("CSV write error: {e}")))
}
