//! Fixtures shared by the unit tests.

use chrono::{DateTime, TimeZone, Utc};
use selling_core::{Address, Client, Money, Product};
use tempfile::TempDir;

use crate::config::{BackendConfig, BackendsConfig};
use crate::database::Database;
use crate::scope::ResourceScope;

/// Three migrated backends inside `dir`.
pub(crate) async fn prepared_backends(dir: &TempDir) -> BackendsConfig {
    Database::prepare(BackendsConfig::in_dir(dir.path()))
        .await
        .expect("backends prepared")
        .backends()
        .clone()
}

pub(crate) fn client(tax_id: &str) -> Client {
    Client {
        id: None,
        name: "Test Client".to_string(),
        tax_id: tax_id.to_string(),
        phone: "555-0100".to_string(),
        address: Address {
            street: "Main Street".to_string(),
            number: "42".to_string(),
            city: "Test City".to_string(),
            state: "Test State".to_string(),
        },
    }
}

pub(crate) fn product(code: &str, cents: i64) -> Product {
    Product {
        id: None,
        code: code.to_string(),
        name: format!("Product {code}"),
        description: "Test product".to_string(),
        price: Money::from_cents(cents),
    }
}

pub(crate) fn sold_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 21, 10, 30, 0).unwrap()
}

pub(crate) async fn count_rows(config: &BackendConfig, table: &str) -> i64 {
    let mut scope = ResourceScope::open(config).await.unwrap();
    let outcome = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(scope.connection())
        .await;
    scope.finish(outcome, "count").await.unwrap()
}
