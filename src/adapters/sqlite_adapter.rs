//! SQLite ledger adapter: `users`, `holdings` and `history` tables.
//!
//! Buys and sells run inside a single `BEGIN IMMEDIATE` transaction, which
//! takes the database write lock before cash or shares are read. Two
//! concurrent trades for the same user therefore serialise, and the second
//! one sees the first one's result.

use chrono::NaiveDateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::domain::account::User;
use crate::domain::error::TraderError;
use crate::domain::ledger::{Fill, Holding, TradeReceipt, Transaction, TIMESTAMP_FORMAT};
use crate::domain::settings::database_path;
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn init_connection(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let db_path = database_path(config)?;
        let pool_size = config.get_int("database", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path).with_init(init_connection);
        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        debug!(path = %db_path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    /// Single-connection in-memory database. Every pooled connection to
    /// `:memory:` is a separate database, so the pool is capped at one.
    pub fn in_memory() -> Result<Self, TraderError> {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        let pool = Pool::builder().max_size(1).build(manager)?;
        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), TraderError> {
        let conn = self.pool.get()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                hash TEXT NOT NULL,
                cash TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS holdings (
                user_id INTEGER NOT NULL REFERENCES users(id),
                symbol TEXT NOT NULL,
                shares INTEGER NOT NULL CHECK (shares > 0),
                PRIMARY KEY (user_id, symbol)
            );
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                symbol TEXT NOT NULL,
                shares INTEGER NOT NULL CHECK (shares <> 0),
                price TEXT NOT NULL,
                executed_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_history_user ON history(user_id, id);",
        )?;

        Ok(())
    }
}

fn decimal_column(row: &Row<'_>, idx: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> Result<NaiveDateTime, rusqlite::Error> {
    let text: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn user_from_row(row: &Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        cash: decimal_column(row, 3)?,
    })
}

fn read_cash(conn: &rusqlite::Connection, user_id: i64) -> Result<Decimal, TraderError> {
    conn.query_row(
        "SELECT cash FROM users WHERE id = ?1",
        params![user_id],
        |row| decimal_column(row, 0),
    )
    .optional()?
    .ok_or_else(|| TraderError::authentication("unknown user"))
}

fn read_shares(
    conn: &rusqlite::Connection,
    user_id: i64,
    symbol: &str,
) -> Result<i64, TraderError> {
    Ok(conn
        .query_row(
            "SELECT shares FROM holdings WHERE user_id = ?1 AND symbol = ?2",
            params![user_id, symbol],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0))
}

fn append_history(
    conn: &rusqlite::Connection,
    fill: &Fill,
    signed_shares: i64,
) -> Result<(), TraderError> {
    conn.execute(
        "INSERT INTO history (user_id, symbol, shares, price, executed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            fill.user_id,
            fill.symbol,
            signed_shares,
            fill.price.to_string(),
            fill.executed_at.format(TIMESTAMP_FORMAT).to_string()
        ],
    )?;
    Ok(())
}

impl LedgerPort for SqliteAdapter {
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        cash: Decimal,
    ) -> Result<User, TraderError> {
        let conn = self.pool.get()?;

        let inserted = conn.execute(
            "INSERT INTO users (username, hash, cash) VALUES (?1, ?2, ?3)",
            params![username, password_hash, cash.to_string()],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(TraderError::DuplicateUsername {
                    username: username.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            cash,
        })
    }

    fn find_user(&self, user_id: i64) -> Result<Option<User>, TraderError> {
        let conn = self.pool.get()?;
        Ok(conn
            .query_row(
                "SELECT id, username, hash, cash FROM users WHERE id = ?1",
                params![user_id],
                user_from_row,
            )
            .optional()?)
    }

    fn find_user_by_name(&self, username: &str) -> Result<Option<User>, TraderError> {
        let conn = self.pool.get()?;
        Ok(conn
            .query_row(
                "SELECT id, username, hash, cash FROM users WHERE username = ?1",
                params![username],
                user_from_row,
            )
            .optional()?)
    }

    fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, TraderError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, symbol, shares FROM holdings WHERE user_id = ?1 ORDER BY symbol",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Holding {
                user_id: row.get(0)?,
                symbol: row.get(1)?,
                shares: row.get(2)?,
            })
        })?;

        let mut holdings = Vec::new();
        for row in rows {
            holdings.push(row?);
        }
        Ok(holdings)
    }

    fn holding(&self, user_id: i64, symbol: &str) -> Result<Option<Holding>, TraderError> {
        let conn = self.pool.get()?;
        let shares = read_shares(&conn, user_id, symbol)?;
        Ok((shares > 0).then(|| Holding {
            user_id,
            symbol: symbol.to_string(),
            shares,
        }))
    }

    fn history(&self, user_id: i64) -> Result<Vec<Transaction>, TraderError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, symbol, shares, price, executed_at
             FROM history WHERE user_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Transaction {
                id: row.get(0)?,
                user_id: row.get(1)?,
                symbol: row.get(2)?,
                shares: row.get(3)?,
                price: decimal_column(row, 4)?,
                executed_at: timestamp_column(row, 5)?,
            })
        })?;

        let mut history = Vec::new();
        for row in rows {
            history.push(row?);
        }
        Ok(history)
    }

    fn last_trade_price(
        &self,
        user_id: i64,
        symbol: &str,
    ) -> Result<Option<Decimal>, TraderError> {
        let conn = self.pool.get()?;
        Ok(conn
            .query_row(
                "SELECT price FROM history WHERE user_id = ?1 AND symbol = ?2
                 ORDER BY id DESC LIMIT 1",
                params![user_id, symbol],
                |row| decimal_column(row, 0),
            )
            .optional()?)
    }

    fn record_buy(&self, fill: &Fill) -> Result<TradeReceipt, TraderError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let cash = read_cash(&tx, fill.user_id)?;
        let cost = fill.notional();
        if cost > cash {
            return Err(TraderError::InsufficientFunds {
                needed: cost,
                available: cash,
            });
        }
        let cash_after = cash - cost;

        tx.execute(
            "UPDATE users SET cash = ?1 WHERE id = ?2",
            params![cash_after.to_string(), fill.user_id],
        )?;
        tx.execute(
            "INSERT INTO holdings (user_id, symbol, shares) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, symbol) DO UPDATE SET shares = shares + excluded.shares",
            params![fill.user_id, fill.symbol, fill.shares],
        )?;
        let shares_after = read_shares(&tx, fill.user_id, &fill.symbol)?;
        append_history(&tx, fill, fill.shares)?;

        tx.commit()?;

        Ok(TradeReceipt {
            symbol: fill.symbol.clone(),
            shares: fill.shares,
            price: fill.price,
            cash_after,
            shares_after,
        })
    }

    fn record_sell(&self, fill: &Fill) -> Result<TradeReceipt, TraderError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let held = read_shares(&tx, fill.user_id, &fill.symbol)?;
        if fill.shares > held {
            return Err(TraderError::InsufficientShares {
                symbol: fill.symbol.clone(),
                requested: fill.shares,
                held,
            });
        }
        let cash_after = read_cash(&tx, fill.user_id)? + fill.notional();
        let shares_after = held - fill.shares;

        tx.execute(
            "UPDATE users SET cash = ?1 WHERE id = ?2",
            params![cash_after.to_string(), fill.user_id],
        )?;
        if shares_after == 0 {
            tx.execute(
                "DELETE FROM holdings WHERE user_id = ?1 AND symbol = ?2",
                params![fill.user_id, fill.symbol],
            )?;
        } else {
            tx.execute(
                "UPDATE holdings SET shares = ?1 WHERE user_id = ?2 AND symbol = ?3",
                params![shares_after, fill.user_id, fill.symbol],
            )?;
        }
        append_history(&tx, fill, -fill.shares)?;

        tx.commit()?;

        Ok(TradeReceipt {
            symbol: fill.symbol.clone(),
            shares: -fill.shares,
            price: fill.price,
            cash_after,
            shares_after,
        })
    }
}
