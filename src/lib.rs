//! # sqlx-named
//!
//! Named `?name` placeholders on top of SQLx's runtime-selected `Any` driver.
//!
//! ## Features
//!
//! - **Named Placeholders**: Write `?user_id` instead of `?` and bind from a map or a struct
//! - **Prepared Statements**: Name tables are built once at prepare time and reused per call
//! - **Transactions**: The same named API on [`Tx`], and statements that run inside it
//! - **Column Mapping**: Read result columns by field name through a pluggable [`Mapper`]
//! - **Tracing**: Optional client span per statement, named after the SQL verb
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["any", "mysql", "runtime-tokio"] }
//! sqlx-named = "0.1"
//! ```
//!
//! ## Examples
//!
//! ### Binding from a map
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use sqlx_named::{Db, DbOptions, Value};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! sqlx::any::install_default_drivers();
//! let db = Db::open("mysql://localhost/test", DbOptions::default()).await?;
//!
//! let mut args = HashMap::new();
//! args.insert("id", Value::from(42));
//! args.insert("name", Value::from("John Doe"));
//!
//! let result = db
//!     .exec_map("INSERT INTO users (id, name) VALUES (?id, ?name)", &args)
//!     .await?;
//! println!("Inserted {} rows", result.rows_affected());
//! # Ok(())
//! # }
//! ```
//!
//! ### Binding from a struct and reading rows by field name
//!
//! ```rust,no_run
//! use sqlx_named::{impl_record, Db, DbOptions};
//!
//! struct Filter {
//!     min_age: i64,
//! }
//!
//! impl_record!(Filter { min_age => "MinAge" });
//!
//! # async fn example(db: Db) -> Result<(), Box<dyn std::error::Error>> {
//! let filter = Filter { min_age: 18 };
//! let mut rows = db
//!     .query_record("SELECT user_name FROM users WHERE age >= ?MinAge", &filter)
//!     .await?;
//! while let Some(row) = rows.next().await? {
//!     let name: String = row.get("UserName")?;
//!     println!("{name}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **Rewrite**: `?name` tokens become the driver's positional markers (`?` or `$n`) and a
//!    [`NameTable`] records which name sits at which marker
//! 2. **Bind**: The table is walked in marker order, pulling each value from the map or record
//! 3. **Execute**: The rewritten SQL and argument list go to SQLx unchanged
//! 4. **Read**: Queries return a [`Rows`] cursor that pulls rows from the database on demand
//!
//! A name used more than once is bound at every occurrence. Rewriting and binding errors are
//! returned before anything reaches the database.
//!
//! ## Cancellation
//!
//! Every call is a future over SQLx futures; dropping it cancels the SQLx call. Dropping a
//! [`Rows`] cursor stops the fetch and hands its connection back.
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod bind;
pub mod builder;
pub mod db;
pub mod error;
pub mod mapper;
pub mod query;
pub mod rows;
pub mod stmt;
mod trace;
pub mod tx;
pub mod value;

pub use bind::{Mapping, Params, Record};
pub use builder::{BuiltQuery, NameTable, PlaceholderStyle};
pub use db::{Db, DbOptions};
pub use error::{Error, Result};
pub use mapper::{CacheMapper, GonicMapper, Mapper, PrefixMapper, SameMapper, SnakeMapper};
pub use rows::{FromNamedRow, Row, Rows};
pub use stmt::Statement;
pub use tx::Tx;
pub use value::{BoxError, ToValue, Value};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::impl_record;
    pub use crate::{
        Db, DbOptions, FromNamedRow, Mapping, Params, Record, Row, Rows, Statement, ToValue, Tx,
        Value,
    };
}
