// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::conn::opts::Opts;
use crate::conn::Conn;
use crate::error::Result as MyResult;

/// Thin connection pool.
///
/// Hands out exclusive [`PooledConn`](struct.PooledConn.html) leases over a
/// shared idle list. Connections found dead at lease time are discarded and
/// replaced; dropping a live lease returns the connection to the pool.
#[derive(Clone)]
pub struct Pool {
    opts: Opts,
    idle: Arc<Mutex<Vec<Conn>>>,
}

impl Pool {
    pub fn new<T: Into<Opts>>(opts: T) -> Pool {
        Pool {
            opts: opts.into(),
            idle: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn idle_list(&self) -> MutexGuard<'_, Vec<Conn>> {
        match self.idle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Leases a connection, opening a new one when the idle list is empty.
    pub fn get_conn(&self) -> MyResult<PooledConn> {
        loop {
            match self.idle_list().pop() {
                Some(conn) => {
                    if conn.is_connected() && !conn.has_pending() {
                        return Ok(PooledConn {
                            pool: self.clone(),
                            conn: Some(conn),
                        });
                    }
                    // dead or dirty: discard and look again
                }
                None => {
                    let conn = Conn::new(self.opts.clone())?;
                    return Ok(PooledConn {
                        pool: self.clone(),
                        conn: Some(conn),
                    });
                }
            }
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle_list().len()
    }
}

/// Exclusive lease on a pooled connection. Dereferences to
/// [`Conn`](../struct.Conn.html).
pub struct PooledConn {
    pool: Pool,
    conn: Option<Conn>,
}

impl Deref for PooledConn {
    type Target = Conn;

    fn deref(&self) -> &Conn {
        self.conn.as_ref().expect("connection was returned to the pool")
    }
}

impl DerefMut for PooledConn {
    fn deref_mut(&mut self) -> &mut Conn {
        self.conn.as_mut().expect("connection was returned to the pool")
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if conn.is_connected() && !conn.has_pending() {
                self.pool.idle_list().push(conn);
            }
        }
    }
}
