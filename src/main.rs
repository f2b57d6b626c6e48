//! minibank demo binary
//!
//! Wires the service by hand at startup (config → logging → pool → gateway
//! → service) and performs one transfer from the command line:
//!
//! ```text
//! minibank [env] <from_id> <to_id> <amount>
//! ```
//!
//! Account creation and everything else around the core stays out of
//! scope; seed the `accounts` table out-of-band before running.

use std::sync::Arc;

use anyhow::{Context, bail};
use rust_decimal::Decimal;

use minibank::config::AppConfig;
use minibank::db::Database;
use minibank::gateway::{PgGateway, ensure_schema};
use minibank::logging::init_logging;
use minibank::transfer::TransferService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Optional leading environment name, then from/to/amount.
    let (env, rest) = match args.len() {
        3 => ("dev".to_string(), &args[..]),
        4 => (args[0].clone(), &args[1..]),
        _ => bail!("usage: minibank [env] <from_id> <to_id> <amount>"),
    };

    let from_id: i64 = rest[0].parse().context("from_id must be an integer")?;
    let to_id: i64 = rest[1].parse().context("to_id must be an integer")?;
    let amount: Decimal = rest[2].parse().context("amount must be a decimal")?;

    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    let postgres_url = config
        .postgres_url
        .as_deref()
        .context("postgres_url missing from config")?;

    let db = Database::connect(postgres_url, &config.database).await?;
    db.health_check().await?;
    ensure_schema(db.pool()).await?;

    let gateway = Arc::new(PgGateway::new(db.pool().clone()));
    let service = TransferService::with_deadline(gateway, config.transfer.deadline());

    match service.transfer(from_id, to_id, amount).await {
        Ok(record) => {
            println!(
                "Transfer committed: #{} {} -> {} amount {} at {}",
                record.id, record.from_id, record.to_id, record.amount, record.created_at
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Transfer failed [{}]: {}", e.code(), e);
            std::process::exit(1);
        }
    }
}
