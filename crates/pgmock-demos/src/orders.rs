//! Order cancellation.
//!
//! Cancelling an order refunds its value plus the reserved fee to the buyer
//! and moves the order to [`ORDER_CANCELLED`]. Only pending orders can be
//! cancelled. The order row is locked with `FOR UPDATE` for the duration of
//! the transaction so two cancellations cannot refund twice.

use once_cell::sync::Lazy;
use pgmock::{Error, FromRow, PgConnection, PgTransaction, Result, columns_aliased};

/// Status of an order awaiting fulfilment.
pub const ORDER_PENDING: i32 = 0;

/// Status of a cancelled order.
pub const ORDER_CANCELLED: i32 = 1;

/// Prepared statement refunding a user's balance.
pub const BALANCE_STMT: &str = "balance_stmt";

/// Prepared statement changing an order's status.
pub const ORDER_STMT: &str = "order_stmt";

const BALANCE_SQL: &str = "UPDATE users SET balance = balance + $1 WHERE id = $2";
const ORDER_SQL: &str = "UPDATE orders SET status = $1 WHERE id = $2";

/// Locking read of an order joined with its buyer.
static LOCK_ORDER_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "SELECT {}, {} FROM orders AS o INNER JOIN users AS u ON o.buyer_id = u.id WHERE o.id = $1 FOR UPDATE",
        columns_aliased::<Order>("o"),
        columns_aliased::<User>("u"),
    )
});

/// An order row, read with the `o` alias.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Order {
    /// Order id.
    pub id: i64,
    /// One of [`ORDER_PENDING`] or [`ORDER_CANCELLED`].
    pub status: i32,
    /// Order value.
    #[pgmock(default)]
    pub value: f64,
    /// Fee reserved when the order was placed.
    #[pgmock(default)]
    pub reserved_fee: f64,
}

impl Order {
    /// Amount returned to the buyer when the order is cancelled.
    #[must_use]
    pub fn refund(&self) -> f64 {
        self.value + self.reserved_fee
    }
}

/// A user row, read with the `u` alias.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    /// User id.
    pub id: i64,
    /// Login name.
    #[pgmock(default)]
    pub username: String,
    /// Account balance.
    #[pgmock(default)]
    pub balance: f64,
}

/// What [`cancel_order`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// The order was cancelled and the buyer refunded.
    Cancelled {
        /// Refunded user.
        user_id: i64,
        /// Refunded amount.
        refund: f64,
    },
    /// The order was not pending; nothing was changed.
    NotPending {
        /// The order's current status.
        status: i32,
    },
}

/// Cancel order `order_id`.
///
/// Runs in one transaction. A non-pending order is left untouched and the
/// transaction rolled back without an error. Any failure rolls the
/// transaction back and returns the failure; a missing order fails with
/// [`Error::NoRows`].
pub async fn cancel_order<C>(db: &C, order_id: i64) -> Result<CancelOutcome>
where
    C: PgConnection + ?Sized,
{
    let tx = db.begin().await?;

    match cancel_locked(&tx, order_id).await {
        Ok(outcome @ CancelOutcome::Cancelled { .. }) => {
            tx.commit().await?;
            tracing::info!(order_id, ?outcome, "order cancelled");
            Ok(outcome)
        }
        Ok(outcome @ CancelOutcome::NotPending { .. }) => {
            tx.rollback().await?;
            tracing::debug!(order_id, ?outcome, "order not cancellable");
            Ok(outcome)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(
                    order_id,
                    error = %err,
                    rollback_error = %rollback_err,
                    "rollback after failed cancellation failed"
                );
            }
            Err(err)
        }
    }
}

async fn cancel_locked<T>(tx: &T, order_id: i64) -> Result<CancelOutcome>
where
    T: PgTransaction,
{
    let row = tx.query_one(&LOCK_ORDER_SQL, &[&order_id]).await?;
    let order = Order::from_row_aliased(&row, "o")?;

    if order.status != ORDER_PENDING {
        return Ok(CancelOutcome::NotPending {
            status: order.status,
        });
    }

    let user = User::from_row_aliased(&row, "u")?;
    let refund = order.refund();

    tx.prepare(BALANCE_STMT, BALANCE_SQL).await?;
    let refunded = tx.execute(BALANCE_STMT, &[&refund, &user.id]).await?;
    expect_one(refunded.rows_affected(), "users")?;

    tx.prepare(ORDER_STMT, ORDER_SQL).await?;
    let updated = tx
        .execute(ORDER_STMT, &[&ORDER_CANCELLED, &order.id])
        .await?;
    expect_one(updated.rows_affected(), "orders")?;

    Ok(CancelOutcome::Cancelled {
        user_id: user.id,
        refund,
    })
}

fn expect_one(rows_affected: u64, table: &str) -> Result<()> {
    if rows_affected == 1 {
        Ok(())
    } else {
        Err(Error::Query(format!(
            "expected to update 1 row in {table}, updated {rows_affected}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_query_selects_aliased_columns() {
        assert!(LOCK_ORDER_SQL.starts_with(
            "SELECT o.id AS o_id, o.status AS o_status, o.value AS o_value, \
             o.reserved_fee AS o_reserved_fee, u.id AS u_id, u.username AS u_username, \
             u.balance AS u_balance FROM orders AS o"
        ));
        assert!(LOCK_ORDER_SQL.ends_with("WHERE o.id = $1 FOR UPDATE"));
    }

    #[test]
    fn test_refund_includes_fee() {
        let order = Order {
            id: 1,
            status: ORDER_PENDING,
            value: 25.75,
            reserved_fee: 3.25,
        };
        assert_eq!(order.refund(), 29.0);
    }
}
