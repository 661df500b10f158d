// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::io;

use byteorder::LittleEndian as LE;
use byteorder::ReadBytesExt;

use crate::conn::query_result::{Or, QueryResult};
use crate::conn::Conn;
use crate::error::{DriverError, Result as MyResult};
use crate::packet::Column;
use crate::params::Params;
use crate::row::Row;

/// Producer of one parameter's chunked upload. Filling less than the whole
/// buffer marks the final chunk.
pub(crate) type ChunkSource = Box<dyn FnMut(&mut [u8]) -> usize + Send>;

/// Server-side prepared statement descriptor.
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct InnerStmt {
    pub(crate) statement_id: u32,
    pub(crate) num_columns: u16,
    pub(crate) num_params: u16,
    pub(crate) warning_count: u16,
    pub(crate) params: Vec<Column>,
    pub(crate) columns: Vec<Column>,
}

impl InnerStmt {
    pub(crate) fn from_payload(pld: &[u8]) -> io::Result<InnerStmt> {
        let mut reader = pld;
        reader.read_u8()?; // 0x00 marker
        let statement_id = reader.read_u32::<LE>()?;
        let num_columns = reader.read_u16::<LE>()?;
        let num_params = reader.read_u16::<LE>()?;
        reader.read_u8()?; // filler
        let warning_count = reader.read_u16::<LE>()?;
        Ok(InnerStmt {
            statement_id,
            num_columns,
            num_params,
            warning_count,
            params: Vec::new(),
            columns: Vec::new(),
        })
    }
}

/// Mysql prepared statement.
///
/// Borrows the connection; the server-side statement is released on
/// [`close`](#method.close) or on drop, whichever comes first. A released
/// statement refuses further operations with `DriverError::NotPrepared`.
pub struct Stmt<'a> {
    conn: &'a mut Conn,
    inner: InnerStmt,
    chunk_sources: Vec<Option<ChunkSource>>,
}

impl<'a> Stmt<'a> {
    pub(crate) fn new(inner: InnerStmt, conn: &'a mut Conn) -> Stmt<'a> {
        let chunk_sources = (0..inner.num_params).map(|_| None).collect();
        Stmt {
            conn,
            inner,
            chunk_sources,
        }
    }

    /// Server-assigned statement id; zero once released.
    pub fn id(&self) -> u32 {
        self.inner.statement_id
    }

    pub fn num_params(&self) -> u16 {
        self.inner.num_params
    }

    pub fn num_columns(&self) -> u16 {
        self.inner.num_columns
    }

    pub fn warnings(&self) -> u16 {
        self.inner.warning_count
    }

    /// Parameter descriptors, as sent by the server. Stubs in practice.
    pub fn params_ref(&self) -> &[Column] {
        &self.inner.params
    }

    /// Result column descriptors, if the statement produces rows.
    pub fn columns_ref(&self) -> &[Column] {
        &self.inner.columns
    }

    /// Index of a result column by name.
    pub fn column_index<T: AsRef<str>>(&self, name: T) -> Option<usize> {
        let name = name.as_ref().as_bytes();
        self.inner.columns.iter().position(|col| col.name == name)
    }

    fn check_prepared(&self) -> MyResult<()> {
        if self.inner.statement_id == 0 {
            Err(DriverError::NotPrepared.into())
        } else {
            Ok(())
        }
    }

    /// Attaches a chunked upload source to parameter `index`. The data is
    /// streamed via `COM_STMT_SEND_LONG_DATA` ahead of every execute; the
    /// bound parameter value is then ignored.
    pub fn set_long_data<F>(&mut self, index: usize, source: F) -> MyResult<()>
    where
        F: FnMut(&mut [u8]) -> usize + Send + 'static,
    {
        self.check_prepared()?;
        if index >= self.chunk_sources.len() {
            return Err(DriverError::MismatchedStmtParams(self.inner.num_params, index + 1).into());
        }
        self.chunk_sources[index] = Some(Box::new(source));
        Ok(())
    }

    /// Executes expecting no result set, returning the affected-rows count.
    pub fn exec<P: Into<Params>>(&mut self, params: P) -> MyResult<u64> {
        self.check_prepared()?;
        match self
            .conn
            .execute_stmt(&self.inner, params.into(), &mut self.chunk_sources)?
        {
            Or::B(ok) => Ok(ok.affected_rows),
            Or::A(_) => {
                self.conn.purge()?;
                Err(DriverError::UnexpectedResultSet.into())
            }
        }
    }

    /// Executes expecting a result set; rows arrive binary-encoded.
    pub fn query<P: Into<Params>>(&mut self, params: P) -> MyResult<QueryResult<'_>> {
        self.check_prepared()?;
        match self
            .conn
            .execute_stmt(&self.inner, params.into(), &mut self.chunk_sources)?
        {
            Or::A(columns) => Ok(QueryResult::new(&mut *self.conn, columns, true)),
            Or::B(_) => Err(DriverError::NoResultSet.into()),
        }
    }

    /// Executes and returns the first row, draining the rest.
    pub fn first<P: Into<Params>>(&mut self, params: P) -> MyResult<Option<Row>> {
        let mut result = self.query(params)?;
        result.next().transpose()
    }

    /// Releases the server-side statement. Idempotent; the server sends no
    /// reply.
    pub fn close(&mut self) -> MyResult<()> {
        if self.inner.statement_id == 0 {
            return Ok(());
        }
        let id = self.inner.statement_id;
        self.inner.statement_id = 0;
        for source in &mut self.chunk_sources {
            *source = None;
        }
        self.conn.close_stmt(id)
    }
}

impl<'a> Drop for Stmt<'a> {
    fn drop(&mut self) {
        if self.inner.statement_id != 0 {
            let _ = self.conn.close_stmt(self.inner.statement_id);
        }
    }
}
