#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{AccessContext, Engine};
use migration::MigratorTrait;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const ROOT: &str = "root";

/// In-memory engine with `alice`, `bob` (role USER) and `root` (role ADMIN).
pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    insert_user(&db, ALICE, "alice@example.com", "USER").await;
    insert_user(&db, BOB, "bob@example.com", "USER").await;
    insert_user(&db, ROOT, "root@example.com", "ADMIN").await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn insert_user(db: &DatabaseConnection, id: &str, email: &str, role: &str) {
    let now = Utc::now();
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "INSERT INTO users (id, name, email, password, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        vec![
            id.into(),
            id.into(),
            email.into(),
            "password".into(),
            role.into(),
            now.into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();
}

pub fn as_user(id: &str) -> AccessContext {
    AccessContext::authenticated(id)
}

pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}
