//! groupctl-store: record-to-table persistence over SQLite.
//!
//! - **Record**: compile-time column metadata for a struct (`record!` macro)
//! - **Condition**: parameterized equality filters
//! - **TableStore**: create / insert / upsert / find / delete / count against
//!   one table per caller-chosen name
//!
//! ```
//! use groupctl_store::{record, Condition, TableStore};
//!
//! record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Setting {
//!         #[column = "gid"]
//!         pub gid: i64,
//!         #[column = "disable"]
//!         pub disable: i64,
//!     }
//! }
//!
//! let store = TableStore::open_in_memory().unwrap();
//! store.create::<Setting>("weather").unwrap();
//! store.insert("weather", &Setting { gid: 1, disable: 0 }).unwrap();
//! let row: Option<Setting> = store.find("weather", &Condition::eq("gid", 1_i64)).unwrap();
//! assert_eq!(row, Some(Setting { gid: 1, disable: 0 }));
//! ```

pub mod condition;
pub mod error;
pub mod record;
pub mod table;

pub use condition::Condition;
pub use error::{Result, StoreError};
pub use record::{column_names, ColumnDef, Record, SqlField, SqlType};
pub use rusqlite::types::Value;
pub use table::{create_table_sql, TableStore};
