use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::db::{self, RetryPolicy};
use crate::AppState;

fn products_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id    SERIAL PRIMARY KEY,
            name  TEXT    NOT NULL,
            stock INTEGER NOT NULL
        )"
    )
}

static SCHEMA: OnceCell<()> = OnceCell::const_new();
static SERIAL: AtomicU32 = AtomicU32::new(0);

/// State whose pool points at a closed port: every query fails fast.
pub fn unreachable_state() -> AppState {
    let options = PgConnectOptions::new()
        .host("127.0.0.1")
        .port(1)
        .username("nobody")
        .database("nothing");

    let db = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy_with(options);

    AppState { db }
}

fn live_options() -> PgConnectOptions {
    dotenv::dotenv().ok();
    Config::from_env()
        .unwrap()
        .database
        .connect_options()
        .unwrap()
}

/// Pool on the database named by `DB_*`, with `products` created if missing.
/// Rows are shared with every other live test; never assume the table is empty.
pub async fn live_pool() -> PgPool {
    let pool = db::connect(live_options(), RetryPolicy::default())
        .await
        .unwrap();

    SCHEMA
        .get_or_init(|| async {
            sqlx::query(&products_ddl("products"))
                .execute(&pool)
                .await
                .unwrap();
        })
        .await;

    pool
}

/// Pool whose `products` resolves to an empty table in a schema of its own.
/// Only one test may use a given `schema`.
pub async fn isolated_pool(schema: &str) -> PgPool {
    let setup = live_pool().await;
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))
        .execute(&setup)
        .await
        .unwrap();
    sqlx::query(&products_ddl(&format!("{schema}.products")))
        .execute(&setup)
        .await
        .unwrap();
    sqlx::query(&format!("TRUNCATE {schema}.products"))
        .execute(&setup)
        .await
        .unwrap();
    setup.close().await;

    let options = live_options().options([("search_path", schema)]);
    db::connect(options, RetryPolicy::default()).await.unwrap()
}

pub fn unique_name(tag: &str) -> String {
    let n = SERIAL.fetch_add(1, Ordering::Relaxed);
    format!("{tag}-{}-{n}", std::process::id())
}

pub async fn count_named(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}
