//! Caller-owned unit of work.

use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `work` inside one immediate transaction.
///
/// Commits when `work` returns `Ok`, rolls back otherwise. Repositories
/// built on `&tx` take part in the same transaction because
/// `Transaction` derefs to `Connection`.
pub fn in_transaction<T, E>(
    conn: &mut Connection,
    work: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<rusqlite::Error>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match work(&tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            warn!("event=tx_rollback module=db status=rolled_back");
            // Dropping the transaction rolls it back.
            drop(tx);
            Err(err)
        }
    }
}
