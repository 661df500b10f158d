// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! ### mylite
//! Lightweight MySql/MariaDb client library implemented in pure rust.
//!
//! Speaks the client/server wire protocol (protocol version 10, servers
//! 4.1.1 and later) directly over TCP: framed packets with sequence-number
//! discipline, `mysql_native_password` authentication, text and binary
//! result sets, and server-side prepared statements.
//!
//! #### Example
//!
//! ```no_run
//! use mylite::{Conn, OptsBuilder, Value};
//!
//! let mut builder = OptsBuilder::new();
//! builder
//!     .ip_or_hostname(Some("127.0.0.1"))
//!     .user(Some("root"))
//!     .pass(Some("password"))
//!     .db_name(Some("test"));
//! let mut conn = Conn::new(builder).unwrap();
//!
//! conn.exec(
//!     "CREATE TEMPORARY TABLE payment (
//!          customer_id int not null,
//!          amount int not null
//!      )",
//! )
//! .unwrap();
//!
//! {
//!     let mut stmt = conn
//!         .prepare("INSERT INTO payment (customer_id, amount) VALUES (?, ?)")
//!         .unwrap();
//!     stmt.exec((1i32, 2i32)).unwrap();
//!     stmt.exec((3i32, 4i32)).unwrap();
//! }
//!
//! let rows = conn
//!     .query("SELECT customer_id, amount FROM payment ORDER BY customer_id")
//!     .unwrap()
//!     .into_set()
//!     .unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0][0], Value::Int(1));
//! assert_eq!(rows[1].get::<i32>(1), Some(4));
//! ```
//!
//! Connections can also be opened from a `key=value;` connection string:
//!
//! ```no_run
//! # use mylite::Conn;
//! let conn = Conn::from_dsn("host=localhost;port=3306;user=root;pwd=password;db=test").unwrap();
//! ```

mod conn;
pub mod consts;
pub mod error;
mod io;
mod packet;
mod params;
mod row;
mod scramble;
mod value;

#[doc(inline)]
pub use crate::conn::opts::{Opts, OptsBuilder};
#[doc(inline)]
pub use crate::conn::pool::{Pool, PooledConn};
#[doc(inline)]
pub use crate::conn::query_result::{QueryResult, ResultSet};
#[doc(inline)]
pub use crate::conn::stmt::Stmt;
#[doc(inline)]
pub use crate::conn::Conn;
#[doc(inline)]
pub use crate::error::{DriverError, DsnError, Error, Result, ServerError};
#[doc(inline)]
pub use crate::io::Transport;
#[doc(inline)]
pub use crate::packet::Column;
#[doc(inline)]
pub use crate::params::{Param, Params};
#[doc(inline)]
pub use crate::row::Row;
#[doc(inline)]
pub use crate::value::{from_value, from_value_opt, Value};

pub mod prelude {
    #[doc(inline)]
    pub use crate::value::FromValue;
}
