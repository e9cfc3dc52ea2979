//! Compile-time record metadata.
//!
//! A [`Record`] describes how a struct maps onto one table row: the ordered
//! column list, the current field values, and how to decode a row back into
//! the struct in place. Column order is field declaration order and the first
//! column is always the primary key.
//!
//! The [`record!`](crate::record!) macro derives all of it from a struct
//! declaration:
//!
//! ```
//! use groupctl_store::{record, Record, SqlType};
//!
//! record! {
//!     #[derive(Debug, Default)]
//!     pub struct Note {
//!         #[column = "id"]
//!         pub id: i64,
//!         #[column = "body"]
//!         pub body: String,
//!     }
//! }
//!
//! let columns = Note::columns();
//! assert_eq!(columns[0].name, "id");
//! assert!(columns[0].primary_key);
//! assert_eq!(columns[1].sql_type, SqlType::Text);
//! ```
//!
//! Marking the first field `#[embed]` makes the struct delegate its whole
//! mapping to that field, so several record shapes can share one header
//! record. Only one level is unwrapped.

use std::fmt;

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// SQL column type emitted in `CREATE TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// 64-bit integer fields
    Int,
    /// Everything else
    Text,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Int => "INT",
            SqlType::Text => "TEXT",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One column of a record descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
    pub primary_key: bool,
}

/// A struct that maps onto a single table row.
pub trait Record {
    /// Column descriptors in declaration order.
    fn columns() -> Vec<ColumnDef>;

    /// Current field values in declaration order.
    fn values(&self) -> Vec<Value>;

    /// Overwrite the fields from one row, in declaration order.
    ///
    /// Either every field is written or, on error, none is.
    fn assign(&mut self, values: Vec<Value>) -> Result<()>;
}

/// Build a descriptor list, marking the first column as primary key.
pub fn describe(fields: &[(&str, SqlType)]) -> Vec<ColumnDef> {
    fields
        .iter()
        .enumerate()
        .map(|(i, (name, sql_type))| ColumnDef {
            name: (*name).to_string(),
            sql_type: *sql_type,
            primary_key: i == 0,
        })
        .collect()
}

/// Column names of a record type, in declaration order.
pub fn column_names<R: Record>() -> Vec<String> {
    R::columns().into_iter().map(|c| c.name).collect()
}

/// Field types that can be stored in a record column.
///
/// Only `i64` is stored as `INT`; every other supported type falls back to
/// `TEXT` and round-trips through its string form.
pub trait SqlField: Sized {
    const SQL_TYPE: SqlType;

    fn to_sql_value(&self) -> Value;

    fn from_sql_value(column: &str, value: Value) -> Result<Self>;
}

fn decode_error(column: &str, message: impl fmt::Display) -> StoreError {
    StoreError::Decode {
        column: column.to_string(),
        message: message.to_string(),
    }
}

impl SqlField for i64 {
    const SQL_TYPE: SqlType = SqlType::Int;

    fn to_sql_value(&self) -> Value {
        Value::Integer(*self)
    }

    fn from_sql_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Integer(v) => Ok(v),
            Value::Null => Ok(0),
            Value::Text(s) => s.trim().parse().map_err(|e| decode_error(column, e)),
            Value::Real(f) => Err(decode_error(column, format!("unexpected real {}", f))),
            Value::Blob(_) => Err(decode_error(column, "unexpected blob")),
        }
    }
}

impl SqlField for String {
    const SQL_TYPE: SqlType = SqlType::Text;

    fn to_sql_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_sql_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Null => Ok(String::new()),
            Value::Integer(v) => Ok(v.to_string()),
            Value::Real(f) => Ok(f.to_string()),
            Value::Blob(b) => String::from_utf8(b).map_err(|e| decode_error(column, e)),
        }
    }
}

macro_rules! text_fallback {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl SqlField for $ty {
                const SQL_TYPE: SqlType = SqlType::Text;

                fn to_sql_value(&self) -> Value {
                    Value::Text(self.to_string())
                }

                fn from_sql_value(column: &str, value: Value) -> Result<Self> {
                    let text = match value {
                        Value::Null => return Ok(<$ty>::default()),
                        Value::Text(s) => s,
                        Value::Integer(v) => v.to_string(),
                        Value::Real(f) => f.to_string(),
                        Value::Blob(_) => return Err(decode_error(column, "unexpected blob")),
                    };
                    text.trim().parse().map_err(|e| decode_error(column, e))
                }
            }
        )+
    };
}

text_fallback!(bool, f64, i32, u32, u64);

#[doc(hidden)]
#[macro_export]
macro_rules! __column_name {
    () => {
        ""
    };
    ($name:literal) => {
        $name
    };
}

/// Declare a struct together with its [`Record`] implementation.
///
/// Fields are tagged with `#[column = "name"]`; an untagged field gets an
/// empty column name, which the table store rejects. A leading `#[embed]`
/// field delegates the mapping to the embedded record and the remaining
/// fields are not persisted.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(#[doc = $edoc:literal])*
            #[embed]
            $evis:vis $efield:ident : $ety:ty
            $(,
                $(#[doc = $fdoc:literal])*
                $(#[column = $fcol:literal])?
                $fvis:vis $field:ident : $fty:ty
            )* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(#[doc = $edoc])*
            $evis $efield: $ety,
            $(
                $(#[doc = $fdoc])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::Record for $name {
            fn columns() -> ::std::vec::Vec<$crate::ColumnDef> {
                <$ety as $crate::Record>::columns()
            }

            fn values(&self) -> ::std::vec::Vec<$crate::Value> {
                $crate::Record::values(&self.$efield)
            }

            fn assign(
                &mut self,
                values: ::std::vec::Vec<$crate::Value>,
            ) -> $crate::Result<()> {
                $crate::Record::assign(&mut self.$efield, values)
            }
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[doc = $fdoc:literal])*
                $(#[column = $col:literal])?
                $fvis:vis $field:ident : $fty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[doc = $fdoc])*
                $fvis $field: $fty,
            )+
        }

        impl $crate::Record for $name {
            fn columns() -> ::std::vec::Vec<$crate::ColumnDef> {
                $crate::record::describe(&[
                    $(
                        (
                            $crate::__column_name!($($col)?),
                            <$fty as $crate::SqlField>::SQL_TYPE,
                        ),
                    )+
                ])
            }

            fn values(&self) -> ::std::vec::Vec<$crate::Value> {
                ::std::vec![$($crate::SqlField::to_sql_value(&self.$field)),+]
            }

            fn assign(
                &mut self,
                values: ::std::vec::Vec<$crate::Value>,
            ) -> $crate::Result<()> {
                let expected = [$(::std::stringify!($field)),+].len();
                if values.len() != expected {
                    return Err($crate::StoreError::ColumnMismatch {
                        expected,
                        found: values.len(),
                    });
                }
                let mut values = values.into_iter();
                let ($($field,)+) = ($(
                    <$fty as $crate::SqlField>::from_sql_value(
                        ::std::stringify!($field),
                        values.next().unwrap_or($crate::Value::Null),
                    )?,
                )+);
                $(self.$field = $field;)+
                Ok(())
            }
        }
    };
}
