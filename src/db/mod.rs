use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgPool};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::*;

// ── Connection ────────────────────────────────────────────────────────────────

/// Bounded startup retry: `attempts` tries, a fixed `delay` between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    /// Upper bound on a single acquire + ping round trip.
    pub probe_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Open the shared pool and block until the database answers a ping.
/// Returns an error once every attempt has failed; the caller treats that
/// as fatal.
pub async fn connect(options: PgConnectOptions, policy: RetryPolicy) -> anyhow::Result<PgPool> {
    let mut last_err = None;

    for attempt in 1..=policy.attempts {
        match try_connect(&options, policy.probe_timeout).await {
            Ok(pool) => {
                info!(attempt, "Connected to the database");
                return Ok(pool);
            }
            Err(err) => {
                warn!(
                    attempt,
                    max_attempts = policy.attempts,
                    error = %err,
                    "Failed to connect to the database"
                );
                last_err = Some(err);
                if attempt < policy.attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    let err = last_err.unwrap_or_else(|| anyhow::anyhow!("no connection attempts configured"));
    Err(err.context(format!(
        "database unreachable after {} attempts",
        policy.attempts
    )))
}

async fn try_connect(options: &PgConnectOptions, probe_timeout: Duration) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect_lazy_with(options.clone());

    let probe = async {
        let mut conn = pool.acquire().await?;
        conn.ping().await
    };
    tokio::time::timeout(probe_timeout, probe)
        .await
        .with_context(|| format!("liveness probe timed out after {probe_timeout:?}"))??;

    Ok(pool)
}

// ── Products ──────────────────────────────────────────────────────────────────

/// No ORDER BY: rows come back in whatever order the database picks.
pub async fn fetch_all_products(pool: &PgPool) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT id, name, stock FROM products")
        .fetch_all(pool)
        .await?;

    Ok(products)
}

pub async fn insert_product(pool: &PgPool, payload: CreateProduct) -> AppResult<Product> {
    let id: i32 =
        sqlx::query_scalar("INSERT INTO products (name, stock) VALUES ($1, $2) RETURNING id")
            .bind(&payload.name)
            .bind(payload.stock)
            .fetch_one(pool)
            .await?;

    Ok(payload.into_product(id))
}

/// Returns the number of rows touched; zero means no product had that id.
pub async fn update_product(pool: &PgPool, product: &Product) -> AppResult<u64> {
    let result = sqlx::query("UPDATE products SET name = $1, stock = $2 WHERE id = $3")
        .bind(&product.name)
        .bind(product.stock)
        .bind(product.id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_product(pool: &PgPool, id: i32) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
