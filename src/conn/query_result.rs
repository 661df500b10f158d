// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::ops::Index;
use std::sync::Arc;

use crate::conn::Conn;
use crate::error::Result as MyResult;
use crate::packet::Column;
use crate::row::{new_row, Row};

pub(crate) enum Or<A, B> {
    A(A),
    B(B),
}

/// Streaming cursor over the rows of one result set.
///
/// Borrows the connection exclusively until dropped; dropping drains any
/// rows left on the wire so the connection is immediately usable again.
pub struct QueryResult<'a> {
    conn: &'a mut Conn,
    columns: Arc<Vec<Column>>,
    is_bin: bool,
}

impl<'a> QueryResult<'a> {
    pub(crate) fn new(conn: &'a mut Conn, columns: Vec<Column>, is_bin: bool) -> QueryResult<'a> {
        QueryResult {
            conn,
            columns: Arc::new(columns),
            is_bin,
        }
    }

    pub fn affected_rows(&self) -> u64 {
        self.conn.affected_rows()
    }

    pub fn last_insert_id(&self) -> u64 {
        self.conn.last_insert_id()
    }

    pub fn warnings(&self) -> u16 {
        self.conn.warnings()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Index of a column by name.
    pub fn column_index<T: AsRef<str>>(&self, name: T) -> Option<usize> {
        let name = name.as_ref().as_bytes();
        self.columns.iter().position(|col| col.name == name)
    }

    /// Reads every remaining row into a random-access
    /// [`ResultSet`](struct.ResultSet.html), releasing the connection.
    pub fn into_set(mut self) -> MyResult<ResultSet> {
        let mut rows = Vec::new();
        for row in &mut self {
            rows.push(row?);
        }
        Ok(ResultSet {
            columns: self.columns.clone(),
            rows,
        })
    }
}

impl<'a> Iterator for QueryResult<'a> {
    type Item = MyResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = if self.is_bin {
            self.conn.next_bin(&self.columns)
        } else {
            self.conn.next_text(&self.columns)
        };
        match next {
            Ok(Some(values)) => Some(Ok(new_row(values, self.columns.clone()))),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<'a> Drop for QueryResult<'a> {
    fn drop(&mut self) {
        if self.conn.has_pending() {
            let _ = self.conn.purge();
        }
    }
}

/// Buffered materialization of a result set.
#[derive(Clone, Debug)]
pub struct ResultSet {
    columns: Arc<Vec<Column>>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_index<T: AsRef<str>>(&self, name: T) -> Option<usize> {
        let name = name.as_ref().as_bytes();
        self.columns.iter().position(|col| col.name == name)
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl Index<usize> for ResultSet {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.rows[index]
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
