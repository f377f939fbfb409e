//! Runs `record_stats` against a scripted mock connection and reports
//! whether the connection saw exactly the declared calls.
//!
//! ```text
//! RUST_LOG=pgmock=debug cargo run -p pgmock-demos --bin record_stats -- --user-id 1 --product-id 5
//! ```

use anyhow::Context;
use clap::Parser;
use pgmock::{CommandTag, Error, MockConn};
use pgmock_demos::record_stats;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "record_stats", about = "Record a product view against a mock connection")]
struct Cli {
    /// Viewing user.
    #[arg(long, default_value_t = 1)]
    user_id: i64,

    /// Viewed product.
    #[arg(long, default_value_t = 5)]
    product_id: i64,

    /// Make the viewer insert fail, exercising the rollback path.
    #[arg(long)]
    fail_insert: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mock = MockConn::new()?;

    mock.expect_begin();
    mock.expect_exec("UPDATE products")
        .will_return_result(CommandTag::new("UPDATE", 1));
    let insert = mock
        .expect_exec("INSERT INTO product_viewers")
        .with_args(&[&cli.user_id, &cli.product_id]);
    if cli.fail_insert {
        insert.will_return_error(Error::server("23503", "insert violates foreign key constraint"));
        mock.expect_rollback();
    } else {
        insert.will_return_result(CommandTag::new("INSERT", 1));
        mock.expect_commit();
    }

    match record_stats(&mock, cli.user_id, cli.product_id).await {
        Ok(()) => tracing::info!(user_id = cli.user_id, product_id = cli.product_id, "view recorded"),
        Err(err) => tracing::warn!(error = %err, "recording failed, transaction rolled back"),
    }

    mock.expectations_were_met()
        .context("mock connection saw unexpected calls")?;
    tracing::info!("all expectations met");
    Ok(())
}
