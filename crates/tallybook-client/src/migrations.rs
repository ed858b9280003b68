use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const KV_STORE_SQL: &str = include_str!("migrations/0001_kv_store.sql");

pub const REQUIRED_TABLE_NAMES: [&str; 2] = ["kv_store", "store_meta"];

pub const REQUIRED_META_KEYS: [(&str, &str); 2] = [
    ("schema_version", "v1"),
    ("backup_format_version", "1.0.0"),
];

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    let migrations = Migrations::new(vec![M::up(KV_STORE_SQL)]);
    migrations.to_latest(conn)
}
