//! Product view statistics.

use pgmock::{Executor, PgConnection, Result, in_transaction};

/// Statement bumping the view counter of every product.
pub const UPDATE_VIEWS: &str = "UPDATE products SET views = views + 1";

/// Statement recording who viewed which product.
pub const INSERT_VIEWER: &str =
    "INSERT INTO product_viewers (user_id, product_id) VALUES ($1, $2)";

/// Record that `user_id` viewed `product_id`.
///
/// Both statements run in one transaction: it is committed when both
/// succeed and rolled back when either fails, in which case the failing
/// statement's error is returned.
pub async fn record_stats<C>(db: &C, user_id: i64, product_id: i64) -> Result<()>
where
    C: PgConnection + ?Sized,
{
    in_transaction(db, move |tx| {
        Box::pin(async move {
            tx.execute(UPDATE_VIEWS, &[]).await?;
            tx.execute(INSERT_VIEWER, &[&user_id, &product_id]).await?;
            Ok(())
        })
    })
    .await?;

    tracing::debug!(user_id, product_id, "product view recorded");
    Ok(())
}
