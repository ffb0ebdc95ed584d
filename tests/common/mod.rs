#![allow(dead_code)]

use sqlx::any::AnyPoolOptions;
use sqlx_named::{impl_record, Db, DbOptions};

pub struct User {
    pub id: i64,
    pub user_name: String,
    pub age: i64,
}

impl_record!(User { id => "ID", user_name => "UserName", age => "Age" });

pub const INSERT_USER: &str =
    "INSERT INTO users (id, user_name, age) VALUES (?ID, ?UserName, ?Age)";

/// A single-connection pool over a private in-memory SQLite database with a `users` table.
pub async fn memory_db(options: DbOptions) -> Db {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    let db = Db::from_pool(pool, options);
    db.exec(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            user_name TEXT NOT NULL,
            age INTEGER NOT NULL
        )",
        vec![],
    )
    .await
    .expect("create users table");
    db
}

pub fn user(id: i64, user_name: &str, age: i64) -> User {
    User {
        id,
        user_name: user_name.to_owned(),
        age,
    }
}

pub async fn count_users(db: &Db) -> i64 {
    db.query_row("SELECT COUNT(*) AS n FROM users", vec![])
        .await
        .expect("count users")
        .get_column("n")
        .expect("decode count")
}
