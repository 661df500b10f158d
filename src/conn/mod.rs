// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::io::Read as StdRead;
use std::io::Write as StdWrite;
use std::net::TcpStream;

use bufstream::BufStream;
use byteorder::LittleEndian as LE;
use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt};

use crate::consts::{self, CapabilityFlags, Command, RefreshFlags, StatusFlags};
use crate::error::{DriverError, Error, Result as MyResult};
use crate::io::{Read, Transport, Write};
use crate::packet::{Column, EofPacket, ErrPacket, HandshakePacket, OkPacket};
use crate::params::Params;
use crate::scramble::scramble;
use crate::value::Value;

pub mod opts;
pub mod pool;
pub mod query_result;
pub mod stmt;

use self::opts::Opts;
use self::query_result::{Or, QueryResult};
use self::stmt::{ChunkSource, InnerStmt, Stmt};

/// Capabilities this driver always asks for. PROTOCOL_41 and
/// SECURE_CONNECTION are hard requirements of the handshake; the rest are
/// informational.
const BASE_CAPABILITIES: u32 = CapabilityFlags::CLIENT_LONG_PASSWORD.bits()
    | CapabilityFlags::CLIENT_LONG_FLAG.bits()
    | CapabilityFlags::CLIENT_CONNECT_WITH_DB.bits()
    | CapabilityFlags::CLIENT_PROTOCOL_41.bits()
    | CapabilityFlags::CLIENT_SECURE_CONNECTION.bits();

const LONG_DATA_CHUNK_LEN: usize = 4096;

/// Mysql connection.
///
/// Owns the transport and the per-command sequence counter. At most one
/// result cursor can be outstanding; commands issued while rows are pending
/// fail with `DriverError::DataPending`.
pub struct Conn {
    opts: Opts,
    stream: Option<BufStream<Box<dyn Transport>>>,
    seq_id: u8,
    capability_flags: CapabilityFlags,
    connection_id: u32,
    status_flags: StatusFlags,
    character_set: u8,
    server_version: String,
    affected_rows: u64,
    last_insert_id: u64,
    warnings: u16,
    connected: bool,
    headers_pending: bool,
    rows_pending: bool,
    binary_pending: bool,
}

impl Conn {
    /// Opens a TCP connection and performs handshake and authentication.
    pub fn new<T: Into<Opts>>(opts: T) -> MyResult<Conn> {
        let mut conn = Conn::empty(opts.into());
        conn.connect_stream()?;
        conn.connect()?;
        Ok(conn)
    }

    /// Same as [`new`](#method.new), starting from a `key=value;`
    /// connection string.
    pub fn from_dsn(dsn: &str) -> MyResult<Conn> {
        let opts = Opts::from_dsn(dsn)?;
        Conn::new(opts)
    }

    /// Performs handshake and authentication over an externally
    /// established transport.
    pub fn with_transport<T: Into<Opts>>(opts: T, transport: Box<dyn Transport>) -> MyResult<Conn> {
        let mut conn = Conn::empty(opts.into());
        conn.stream = Some(BufStream::new(transport));
        conn.connect()?;
        Ok(conn)
    }

    fn empty(opts: Opts) -> Conn {
        Conn {
            opts,
            stream: None,
            seq_id: 0,
            capability_flags: CapabilityFlags::empty(),
            connection_id: 0,
            status_flags: StatusFlags::empty(),
            character_set: 0,
            server_version: String::new(),
            affected_rows: 0,
            last_insert_id: 0,
            warnings: 0,
            connected: false,
            headers_pending: false,
            rows_pending: false,
            binary_pending: false,
        }
    }

    fn connect_stream(&mut self) -> MyResult<()> {
        let addr = (self.opts.get_ip_or_hostname(), self.opts.get_tcp_port());
        match TcpStream::connect(addr) {
            Ok(stream) => {
                let _ = stream.set_nodelay(true);
                self.stream = Some(BufStream::new(Box::new(stream) as Box<dyn Transport>));
                Ok(())
            }
            Err(err) => {
                Err(DriverError::CouldNotConnect(self.opts.addr_display(), err.to_string()).into())
            }
        }
    }

    /// Drops the transport and marks the connection dead. Called on every
    /// transport or protocol failure; the sequence numbering cannot be
    /// trusted afterwards.
    fn kill(&mut self) {
        self.stream = None;
        self.connected = false;
        self.headers_pending = false;
        self.rows_pending = false;
        self.binary_pending = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected && self.stream.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.headers_pending || self.rows_pending
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn last_insert_id(&self) -> u64 {
        self.last_insert_id
    }

    pub fn warnings(&self) -> u16 {
        self.warnings
    }

    pub fn status_flags(&self) -> StatusFlags {
        self.status_flags
    }

    /// Capabilities negotiated at handshake.
    pub fn capability_flags(&self) -> CapabilityFlags {
        self.capability_flags
    }

    pub fn character_set(&self) -> u8 {
        self.character_set
    }

    /// Reads one logical packet, reassembling 0xffffff-sized continuation
    /// frames and validating the sequence number of every frame.
    pub(crate) fn read_packet(&mut self) -> MyResult<Vec<u8>> {
        match self.read_packet_inner() {
            Ok(payload) => Ok(payload),
            Err(err) => {
                if err.is_fatal() {
                    self.kill();
                }
                Err(err)
            }
        }
    }

    fn read_packet_inner(&mut self) -> MyResult<Vec<u8>> {
        let mut output = Vec::new();
        loop {
            let (payload_len, seq_id) = {
                let stream = self
                    .stream
                    .as_mut()
                    .ok_or(DriverError::ConnectionClosed)?;
                let payload_len = stream.read_uint::<LE>(3)? as usize;
                let seq_id = stream.read_u8()?;
                (payload_len, seq_id)
            };
            if seq_id != self.seq_id {
                return Err(DriverError::PacketOutOfSync.into());
            }
            self.seq_id = self.seq_id.wrapping_add(1);
            if payload_len == 0 {
                break;
            }
            let pos = output.len();
            output.resize(pos + payload_len, 0u8);
            self.stream
                .as_mut()
                .ok_or(DriverError::ConnectionClosed)?
                .read_exact(&mut output[pos..])?;
            if payload_len < consts::MAX_PAYLOAD_LEN {
                break;
            }
        }
        Ok(output)
    }

    fn write_packet(&mut self, data: &[u8]) -> MyResult<()> {
        match self.write_packet_inner(data) {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.is_fatal() {
                    self.kill();
                }
                Err(err)
            }
        }
    }

    fn write_packet_inner(&mut self, data: &[u8]) -> MyResult<()> {
        let mut seq_id = self.seq_id;
        {
            let stream = self
                .stream
                .as_mut()
                .ok_or(DriverError::ConnectionClosed)?;
            if data.is_empty() {
                stream.write_all(&[0, 0, 0, seq_id])?;
                seq_id = seq_id.wrapping_add(1);
            } else {
                let mut last_was_max = false;
                for chunk in data.chunks(consts::MAX_PAYLOAD_LEN) {
                    last_was_max = chunk.len() == consts::MAX_PAYLOAD_LEN;
                    let mut header = [0u8; 4];
                    LE::write_u24(&mut header[..3], chunk.len() as u32);
                    header[3] = seq_id;
                    seq_id = seq_id.wrapping_add(1);
                    stream.write_all(&header)?;
                    stream.write_all(chunk)?;
                }
                if last_was_max {
                    stream.write_all(&[0, 0, 0, seq_id])?;
                    seq_id = seq_id.wrapping_add(1);
                }
            }
            stream.flush()?;
        }
        self.seq_id = seq_id;
        Ok(())
    }

    /// Every command starts a new sequence.
    fn write_command_data(&mut self, cmd: Command, data: &[u8]) -> MyResult<()> {
        if self.stream.is_none() {
            return Err(DriverError::ConnectionClosed.into());
        }
        if self.has_pending() {
            return Err(DriverError::DataPending.into());
        }
        self.seq_id = 0;
        let mut buf = Vec::with_capacity(1 + data.len());
        buf.push(cmd as u8);
        buf.extend_from_slice(data);
        self.write_packet(&buf)
    }

    fn write_command(&mut self, cmd: Command) -> MyResult<()> {
        self.write_command_data(cmd, &[])
    }

    fn connect(&mut self) -> MyResult<()> {
        if self.connected {
            return Ok(());
        }
        self.seq_id = 0;
        match self.do_handshake() {
            Ok(()) => {
                self.connected = true;
                Ok(())
            }
            Err(err) => {
                self.kill();
                Err(err)
            }
        }
    }

    fn do_handshake(&mut self) -> MyResult<()> {
        let pld = self.read_packet()?;
        if pld.first() == Some(&0xff) {
            let err = ErrPacket::from_payload(&pld).map_err(|_| DriverError::MalformedPacket)?;
            return Err(Error::AuthError(err.into()));
        }
        let handshake =
            HandshakePacket::from_payload(&pld).map_err(|_| DriverError::MalformedPacket)?;
        if handshake.protocol_version != 10 {
            return Err(DriverError::UnsupportedProtocol(handshake.protocol_version).into());
        }
        if !handshake
            .capability_flags
            .contains(CapabilityFlags::CLIENT_PROTOCOL_41)
        {
            return Err(DriverError::Protocol41NotSet.into());
        }
        if !handshake
            .capability_flags
            .contains(CapabilityFlags::CLIENT_SECURE_CONNECTION)
        {
            return Err(DriverError::SecureConnectionNotSet.into());
        }
        self.connection_id = handshake.connection_id;
        self.status_flags = handshake.status_flags;
        self.character_set = handshake.character_set;
        self.server_version = handshake.server_version.clone();
        self.do_handshake_response(&handshake)?;
        let pld = self.read_packet()?;
        match pld.first() {
            Some(&0x00) => {
                let ok = OkPacket::from_payload(&pld).map_err(|_| DriverError::MalformedPacket)?;
                self.handle_ok(&ok);
                Ok(())
            }
            Some(&0xff) => {
                let err =
                    ErrPacket::from_payload(&pld).map_err(|_| DriverError::MalformedPacket)?;
                Err(Error::AuthError(err.into()))
            }
            _ => Err(DriverError::UnexpectedPacket.into()),
        }
    }

    fn do_handshake_response(&mut self, handshake: &HandshakePacket) -> MyResult<()> {
        let requested = CapabilityFlags::from_bits_truncate(BASE_CAPABILITIES)
            | self.opts.get_additional_capabilities();
        let mut client_flags = (handshake.capability_flags & requested)
            | CapabilityFlags::CLIENT_PROTOCOL_41
            | CapabilityFlags::CLIENT_SECURE_CONNECTION;
        let db_name = self.opts.get_db_name();
        if db_name.is_empty() {
            client_flags.remove(CapabilityFlags::CLIENT_CONNECT_WITH_DB);
        }
        let token = scramble(&handshake.auth_plugin_data, self.opts.get_pass().as_bytes());

        let user = self.opts.get_user();
        let mut writer = Vec::with_capacity(4 + 4 + 1 + 23 + user.len() + 1 + 21 + db_name.len() + 1);
        writer.write_u32::<LE>(client_flags.bits())?;
        writer.write_u32::<LE>(1)?; // max packet size
        writer.write_u8(consts::UTF8_GENERAL_CI)?;
        writer.write_all(&[0u8; 23])?;
        writer.write_null_str(user.as_bytes())?;
        match token {
            Some(token) => {
                writer.write_u8(token.len() as u8)?;
                writer.write_all(&token)?;
            }
            None => writer.write_u8(0)?,
        }
        if client_flags.contains(CapabilityFlags::CLIENT_CONNECT_WITH_DB) {
            writer.write_null_str(db_name.as_bytes())?;
        }
        self.capability_flags = client_flags;
        self.write_packet(&writer)
    }

    fn handle_ok(&mut self, ok: &OkPacket) {
        self.affected_rows = ok.affected_rows;
        self.last_insert_id = ok.last_insert_id;
        self.status_flags = ok.status_flags;
        self.warnings = ok.warnings;
    }

    fn handle_eof(&mut self, eof: &EofPacket) {
        self.status_flags = eof.status_flags;
        self.warnings = eof.warnings;
    }

    /// Turns an 0xff payload into the matching error, killing the
    /// connection only when the payload itself cannot be parsed.
    fn handle_err_packet(&mut self, pld: &[u8]) -> Error {
        match ErrPacket::from_payload(pld) {
            Ok(err) => Error::ServerError(err.into()),
            Err(_) => {
                self.kill();
                DriverError::MalformedPacket.into()
            }
        }
    }

    /// Classifies the first reply packet of a command that may carry a
    /// result set and, for result sets, ingests the column headers up to
    /// the first EOF.
    pub(crate) fn handle_result_set(&mut self, binary: bool) -> MyResult<Or<Vec<Column>, OkPacket>> {
        let pld = self.read_packet()?;
        match pld.first() {
            Some(&0x00) => {
                let ok = match OkPacket::from_payload(&pld) {
                    Ok(ok) => ok,
                    Err(_) => {
                        self.kill();
                        return Err(DriverError::MalformedPacket.into());
                    }
                };
                self.handle_ok(&ok);
                Ok(Or::B(ok))
            }
            Some(&0xff) => Err(self.handle_err_packet(&pld)),
            Some(_) => {
                let column_count = {
                    let mut reader = &pld[..];
                    match reader.read_lenenc_int() {
                        Ok(count) => count,
                        Err(_) => {
                            self.kill();
                            return Err(DriverError::MalformedPacket.into());
                        }
                    }
                };
                self.headers_pending = true;
                self.rows_pending = true;
                self.binary_pending = binary;
                let mut columns = Vec::with_capacity(column_count as usize);
                for _ in 0..column_count {
                    let pld = self.read_packet()?;
                    if EofPacket::is_eof(&pld) {
                        self.kill();
                        return Err(DriverError::UnexpectedPacket.into());
                    }
                    match Column::from_payload(&pld) {
                        Ok(column) => columns.push(column),
                        Err(err) => {
                            if err.is_fatal() {
                                self.kill();
                            }
                            return Err(err);
                        }
                    }
                }
                let pld = self.read_packet()?;
                if !EofPacket::is_eof(&pld) {
                    self.kill();
                    return Err(DriverError::UnexpectedPacket.into());
                }
                match EofPacket::from_payload(&pld) {
                    Ok(eof) => self.handle_eof(&eof),
                    Err(_) => {
                        self.kill();
                        return Err(DriverError::MalformedPacket.into());
                    }
                }
                self.headers_pending = false;
                Ok(Or::A(columns))
            }
            None => {
                self.kill();
                Err(DriverError::MalformedPacket.into())
            }
        }
    }

    /// Reads the next text-protocol row, or `None` on the terminating EOF.
    pub(crate) fn next_text(&mut self, columns: &[Column]) -> MyResult<Option<Vec<Value>>> {
        self.next_row(columns, false)
    }

    /// Reads the next binary-protocol row, or `None` on the terminating
    /// EOF.
    pub(crate) fn next_bin(&mut self, columns: &[Column]) -> MyResult<Option<Vec<Value>>> {
        self.next_row(columns, true)
    }

    fn next_row(&mut self, columns: &[Column], binary: bool) -> MyResult<Option<Vec<Value>>> {
        if !self.rows_pending {
            return Ok(None);
        }
        let pld = self.read_packet()?;
        if pld.first() == Some(&0xff) {
            self.rows_pending = false;
            self.binary_pending = false;
            return Err(self.handle_err_packet(&pld));
        }
        if EofPacket::is_eof(&pld) {
            match EofPacket::from_payload(&pld) {
                Ok(eof) => self.handle_eof(&eof),
                Err(_) => {
                    self.kill();
                    return Err(DriverError::MalformedPacket.into());
                }
            }
            self.rows_pending = false;
            self.binary_pending = false;
            return Ok(None);
        }
        let parsed = if binary {
            Value::from_bin_payload(&pld, columns)
        } else {
            Value::from_payload(&pld, columns)
        };
        match parsed {
            Ok(values) => Ok(Some(values)),
            Err(err) => {
                if err.is_fatal() {
                    self.kill();
                }
                Err(err)
            }
        }
    }

    /// Drains an abandoned result up to and including the terminating EOF,
    /// returning the number of rows thrown away. New commands are refused
    /// until this has happened.
    pub fn purge(&mut self) -> MyResult<u64> {
        let mut drained = 0u64;
        while self.headers_pending {
            let pld = self.read_packet()?;
            if EofPacket::is_eof(&pld) {
                if let Ok(eof) = EofPacket::from_payload(&pld) {
                    self.handle_eof(&eof);
                }
                self.headers_pending = false;
            }
        }
        while self.rows_pending {
            let pld = self.read_packet()?;
            if pld.first() == Some(&0xff) {
                self.rows_pending = false;
                self.binary_pending = false;
                return Err(self.handle_err_packet(&pld));
            }
            if EofPacket::is_eof(&pld) {
                if let Ok(eof) = EofPacket::from_payload(&pld) {
                    self.handle_eof(&eof);
                }
                self.rows_pending = false;
                self.binary_pending = false;
            } else {
                drained += 1;
            }
        }
        Ok(drained)
    }

    /// Implements the text protocol for statements that produce a result
    /// set. An OK-only reply is reported as `DriverError::NoResultSet`.
    ///
    /// The returned [`QueryResult`](conn/query_result/struct.QueryResult.html)
    /// borrows the connection until it is dropped or fully read.
    pub fn query(&mut self, query: &str) -> MyResult<QueryResult<'_>> {
        self.write_command_data(Command::COM_QUERY, query.as_bytes())?;
        match self.handle_result_set(false)? {
            Or::A(columns) => Ok(QueryResult::new(self, columns, false)),
            Or::B(_) => Err(DriverError::NoResultSet.into()),
        }
    }

    /// Implements the text protocol for statements that produce no result
    /// set, returning the number of affected rows. A result set is purged
    /// and reported as `DriverError::UnexpectedResultSet`.
    pub fn exec(&mut self, query: &str) -> MyResult<u64> {
        self.write_command_data(Command::COM_QUERY, query.as_bytes())?;
        match self.handle_result_set(false)? {
            Or::B(ok) => Ok(ok.affected_rows),
            Or::A(_) => {
                self.purge()?;
                Err(DriverError::UnexpectedResultSet.into())
            }
        }
    }

    /// Prepares a statement. The returned [`Stmt`](conn/stmt/struct.Stmt.html)
    /// borrows the connection and releases the server-side statement when
    /// dropped.
    pub fn prepare(&mut self, query: &str) -> MyResult<Stmt<'_>> {
        let inner = self._prepare(query)?;
        Ok(Stmt::new(inner, self))
    }

    fn _prepare(&mut self, query: &str) -> MyResult<InnerStmt> {
        self.write_command_data(Command::COM_STMT_PREPARE, query.as_bytes())?;
        let pld = self.read_packet()?;
        match pld.first() {
            Some(&0xff) => Err(self.handle_err_packet(&pld)),
            Some(&0x00) => {
                let mut stmt = match InnerStmt::from_payload(&pld) {
                    Ok(stmt) => stmt,
                    Err(_) => {
                        self.kill();
                        return Err(DriverError::MalformedPacket.into());
                    }
                };
                if stmt.num_params > 0 {
                    // Stub descriptors; the server's parameter typing is
                    // not informative.
                    let mut params = Vec::with_capacity(stmt.num_params as usize);
                    for _ in 0..stmt.num_params {
                        let pld = self.read_packet()?;
                        match Column::from_payload(&pld) {
                            Ok(column) => params.push(column),
                            Err(err) => {
                                if err.is_fatal() {
                                    self.kill();
                                }
                                return Err(err);
                            }
                        }
                    }
                    self.skip_eof()?;
                    stmt.params = params;
                }
                if stmt.num_columns > 0 {
                    let mut columns = Vec::with_capacity(stmt.num_columns as usize);
                    for _ in 0..stmt.num_columns {
                        let pld = self.read_packet()?;
                        match Column::from_payload(&pld) {
                            Ok(column) => columns.push(column),
                            Err(err) => {
                                if err.is_fatal() {
                                    self.kill();
                                }
                                return Err(err);
                            }
                        }
                    }
                    self.skip_eof()?;
                    stmt.columns = columns;
                }
                Ok(stmt)
            }
            _ => {
                self.kill();
                Err(DriverError::UnexpectedPacket.into())
            }
        }
    }

    fn skip_eof(&mut self) -> MyResult<()> {
        let pld = self.read_packet()?;
        if EofPacket::is_eof(&pld) {
            Ok(())
        } else {
            self.kill();
            Err(DriverError::UnexpectedPacket.into())
        }
    }

    pub(crate) fn execute_stmt(
        &mut self,
        stmt: &InnerStmt,
        params: Params,
        chunk_sources: &mut [Option<ChunkSource>],
    ) -> MyResult<Or<Vec<Column>, OkPacket>> {
        let params = params.into_positional();
        if stmt.num_params as usize != params.len() {
            return Err(DriverError::MismatchedStmtParams(stmt.num_params, params.len()).into());
        }

        // Build the whole payload first: a rejected parameter must leave
        // the wire untouched.
        let mut payload = Vec::new();
        payload.write_u32::<LE>(stmt.statement_id)?;
        payload.write_u8(0)?; // flags
        payload.write_u32::<LE>(1)?; // iteration count
        if !params.is_empty() {
            let mut bitmap = vec![0u8; (params.len() + 7) / 8];
            let mut values = Vec::new();
            for (i, param) in params.iter().enumerate() {
                if param.is_null() {
                    bitmap[i / 8] |= 1 << (i % 8);
                } else if chunk_sources.get(i).map(Option::is_some) != Some(true) {
                    param.value.write_bin(&mut values, param.coltype, param.unsigned)?;
                }
            }
            payload.extend_from_slice(&bitmap);
            payload.write_u8(1)?; // new-types-bound
            for param in &params {
                payload.write_u8(param.coltype as u8)?;
                payload.write_u8(if param.unsigned { 0x80 } else { 0 })?;
            }
            payload.extend_from_slice(&values);
        }

        for (i, source) in chunk_sources.iter_mut().enumerate() {
            if let Some(source) = source {
                self.send_long_data(stmt.statement_id, i as u16, source)?;
            }
        }

        self.write_command_data(Command::COM_STMT_EXECUTE, &payload)?;
        self.handle_result_set(true)
    }

    /// Streams one parameter's data ahead of the execute. Every chunk is a
    /// command of its own; the server sends no reply.
    fn send_long_data(
        &mut self,
        statement_id: u32,
        param_index: u16,
        source: &mut ChunkSource,
    ) -> MyResult<()> {
        let mut chunk = [0u8; LONG_DATA_CHUNK_LEN];
        loop {
            let filled = source(&mut chunk);
            if filled > 0 {
                let mut buf = Vec::with_capacity(6 + filled);
                buf.write_u32::<LE>(statement_id)?;
                buf.write_u16::<LE>(param_index)?;
                buf.extend_from_slice(&chunk[..filled]);
                self.write_command_data(Command::COM_STMT_SEND_LONG_DATA, &buf)?;
            }
            if filled < chunk.len() {
                return Ok(());
            }
        }
    }

    /// Releases a server-side statement. Fire and forget.
    pub(crate) fn close_stmt(&mut self, statement_id: u32) -> MyResult<()> {
        let mut buf = [0u8; 4];
        LE::write_u32(&mut buf, statement_id);
        self.write_command_data(Command::COM_STMT_CLOSE, &buf)
    }

    /// Changes the default database.
    pub fn select_db(&mut self, db_name: &str) -> MyResult<()> {
        self.write_command_data(Command::COM_INIT_DB, db_name.as_bytes())?;
        self.read_ok_response().map(drop)
    }

    /// Checks that the server is alive.
    pub fn ping(&mut self) -> MyResult<()> {
        self.write_command(Command::COM_PING)?;
        self.read_ok_response().map(drop)
    }

    /// Flushes server-side caches per `flags`.
    pub fn refresh(&mut self, flags: RefreshFlags) -> MyResult<()> {
        self.write_command_data(Command::COM_REFRESH, &[flags.bits()])?;
        self.read_ok_response().map(drop)
    }

    /// Returns the server's one-line statistics string. The reply has no
    /// OK/ERR framing.
    pub fn stats(&mut self) -> MyResult<String> {
        self.write_command(Command::COM_STATISTICS)?;
        let pld = self.read_packet()?;
        Ok(String::from_utf8_lossy(&pld).into_owned())
    }

    /// Toggles multi-statement support via `COM_SET_OPTION`.
    ///
    /// The server replies with a 5-byte EOF-shaped packet (documented
    /// behavior for 4.1+); anything else is a protocol error.
    pub fn set_multi_statements(&mut self, enable: bool) -> MyResult<()> {
        let option: u16 = if enable { 0 } else { 1 };
        let mut buf = [0u8; 2];
        LE::write_u16(&mut buf, option);
        self.write_command_data(Command::COM_SET_OPTION, &buf)?;
        let pld = self.read_packet()?;
        if EofPacket::is_eof(&pld) {
            if let Ok(eof) = EofPacket::from_payload(&pld) {
                self.handle_eof(&eof);
            }
            Ok(())
        } else if pld.first() == Some(&0xff) {
            Err(self.handle_err_packet(&pld))
        } else {
            self.kill();
            Err(DriverError::UnexpectedPacket.into())
        }
    }

    fn read_ok_response(&mut self) -> MyResult<OkPacket> {
        let pld = self.read_packet()?;
        match pld.first() {
            Some(&0x00) => match OkPacket::from_payload(&pld) {
                Ok(ok) => {
                    self.handle_ok(&ok);
                    Ok(ok)
                }
                Err(_) => {
                    self.kill();
                    Err(DriverError::MalformedPacket.into())
                }
            },
            Some(&0xff) => Err(self.handle_err_packet(&pld)),
            _ => {
                self.kill();
                Err(DriverError::UnexpectedPacket.into())
            }
        }
    }

    /// Sends `COM_QUIT` (best effort, the server does not reply) and drops
    /// the transport.
    pub fn quit(&mut self) {
        if self.stream.is_some() {
            let _ = self.purge();
            let _ = self.write_command(Command::COM_QUIT);
        }
        self.kill();
    }

    /// Re-establishes a dead connection with the stored options. A no-op
    /// while the connection is alive.
    pub fn reconnect(&mut self) -> MyResult<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.reset()
    }

    /// Drops all connection state and reconnects.
    pub fn reset(&mut self) -> MyResult<()> {
        self.kill();
        self.seq_id = 0;
        self.capability_flags = CapabilityFlags::empty();
        self.connection_id = 0;
        self.status_flags = StatusFlags::empty();
        self.character_set = 0;
        self.server_version = String::new();
        self.affected_rows = 0;
        self.last_insert_id = 0;
        self.warnings = 0;
        self.connect_stream()?;
        self.connect()
    }
}

impl Drop for Conn {
    fn drop(&mut self) {
        self.quit();
    }
}

#[cfg(test)]
mod test {
    use std::io;
    use std::io::Read as _;
    use std::sync::{Arc, Mutex};

    use byteorder::LittleEndian as LE;
    use byteorder::{ByteOrder, WriteBytesExt};

    use super::opts::{Opts, OptsBuilder};
    use super::Conn;
    use crate::consts::{CapabilityFlags, ColumnType, MAX_PAYLOAD_LEN};
    use crate::error::{DriverError, Error};
    use crate::io::Write;
    use crate::scramble::scramble;
    use crate::value::Value;

    /// In-memory transport: a scripted server-to-client byte stream plus a
    /// shared capture of everything the client writes.
    struct MockStream {
        input: io::Cursor<Vec<u8>>,
        written: Arc<Mutex<Vec<u8>>>,
    }

    impl io::Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl io::Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    const SALT: &[u8; 20] = b"abcdefghijABCDEFGHIJ";

    fn frame(seq: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; 4];
        LE::write_u24(&mut out[..3], payload.len() as u32);
        out[3] = seq;
        out.extend_from_slice(payload);
        out
    }

    fn greeting_payload() -> Vec<u8> {
        let mut pld = Vec::new();
        pld.push(0x0a);
        pld.extend_from_slice(b"5.7.30-test\x00");
        pld.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);
        pld.extend_from_slice(&SALT[..8]);
        pld.push(0x00);
        // PROTOCOL_41 | SECURE_CONNECTION | CONNECT_WITH_DB | LONG_FLAG | LONG_PASSWORD
        pld.extend_from_slice(&[0x0d, 0x82]);
        pld.push(33);
        pld.extend_from_slice(&[0x02, 0x00]);
        pld.extend_from_slice(&[0x00, 0x00]);
        pld.push(0x00);
        pld.extend_from_slice(&[0u8; 10]);
        pld.extend_from_slice(&SALT[8..]);
        pld.push(0x00);
        pld
    }

    fn ok_payload(affected_rows: u64, last_insert_id: u64) -> Vec<u8> {
        let mut pld = vec![0x00];
        pld.write_lenenc_int(affected_rows).unwrap();
        pld.write_lenenc_int(last_insert_id).unwrap();
        pld.extend_from_slice(&[0x02, 0x00, 0x00, 0x00]);
        pld
    }

    fn eof_payload() -> Vec<u8> {
        vec![0xfe, 0x00, 0x00, 0x02, 0x00]
    }

    fn err_payload(code: u16, state: &str, message: &str) -> Vec<u8> {
        let mut pld = vec![0xff];
        pld.write_u16::<LE>(code).unwrap();
        pld.push(b'#');
        pld.extend_from_slice(state.as_bytes());
        pld.extend_from_slice(message.as_bytes());
        pld
    }

    fn column_payload(name: &str, column_type: ColumnType, flags: u16, charset: u16) -> Vec<u8> {
        let mut pld = Vec::new();
        pld.write_lenenc_bytes(b"def").unwrap();
        pld.write_lenenc_bytes(b"testdb").unwrap();
        pld.write_lenenc_bytes(b"t").unwrap();
        pld.write_lenenc_bytes(b"t").unwrap();
        pld.write_lenenc_bytes(name.as_bytes()).unwrap();
        pld.write_lenenc_bytes(name.as_bytes()).unwrap();
        pld.push(0x0c);
        pld.write_u16::<LE>(charset).unwrap();
        pld.write_u32::<LE>(255).unwrap();
        pld.push(column_type as u8);
        pld.write_u16::<LE>(flags).unwrap();
        pld.push(0);
        pld.extend_from_slice(&[0x00, 0x00]);
        pld
    }

    fn text_row(cells: &[Option<&[u8]>]) -> Vec<u8> {
        let mut pld = Vec::new();
        for cell in cells {
            match cell {
                Some(bytes) => pld.write_lenenc_bytes(bytes).unwrap(),
                None => pld.push(0xfb),
            }
        }
        pld
    }

    fn stmt_ok_payload(statement_id: u32, num_columns: u16, num_params: u16) -> Vec<u8> {
        let mut pld = vec![0x00];
        pld.write_u32::<LE>(statement_id).unwrap();
        pld.write_u16::<LE>(num_columns).unwrap();
        pld.write_u16::<LE>(num_params).unwrap();
        pld.push(0x00);
        pld.write_u16::<LE>(0).unwrap();
        pld
    }

    fn test_opts() -> Opts {
        let mut builder = OptsBuilder::new();
        builder
            .user(Some("testuser"))
            .pass(Some("testpassword"))
            .db_name(Some("testdb"));
        builder.into()
    }

    /// Connects over a scripted conversation. `server_packets` are the
    /// packets following the login reply.
    fn connect_scripted(
        opts: Opts,
        server_packets: Vec<Vec<u8>>,
    ) -> (Conn, Arc<Mutex<Vec<u8>>>) {
        let mut input = Vec::new();
        input.extend_from_slice(&frame(0, &greeting_payload()));
        input.extend_from_slice(&frame(2, &ok_payload(0, 0)));
        for packet in server_packets {
            input.extend_from_slice(&packet);
        }
        let written = Arc::new(Mutex::new(Vec::new()));
        let stream = MockStream {
            input: io::Cursor::new(input),
            written: written.clone(),
        };
        let conn = Conn::with_transport(opts, Box::new(stream)).unwrap();
        (conn, written)
    }

    #[test]
    fn should_perform_handshake_and_send_login_packet() {
        let (conn, written) = connect_scripted(test_opts(), vec![]);
        assert!(conn.is_connected());
        assert_eq!(conn.server_version(), "5.7.30-test");
        assert_eq!(conn.connection_id(), 1);

        let written = written.lock().unwrap();
        // login frame: header + payload, sequence 1
        assert_eq!(written[3], 1);
        let pld = &written[4..];
        let flags = CapabilityFlags::from_bits_truncate(LE::read_u32(&pld[..4]));
        assert!(flags.contains(CapabilityFlags::CLIENT_PROTOCOL_41));
        assert!(flags.contains(CapabilityFlags::CLIENT_SECURE_CONNECTION));
        assert!(flags.contains(CapabilityFlags::CLIENT_CONNECT_WITH_DB));
        assert_eq!(LE::read_u32(&pld[4..8]), 1);
        assert_eq!(pld[8], 33);
        assert_eq!(&pld[9..32], &[0u8; 23][..]);
        let rest = &pld[32..];
        assert_eq!(&rest[..9], b"testuser\x00");
        let rest = &rest[9..];
        assert_eq!(rest[0], 20);
        let token = scramble(&SALT[..], b"testpassword").unwrap();
        assert_eq!(&rest[1..21], &token[..]);
        assert_eq!(&rest[21..], b"testdb\x00");
    }

    #[test]
    fn should_send_empty_token_for_empty_password() {
        let mut builder = OptsBuilder::new();
        builder.user(Some("root"));
        let (_conn, written) = connect_scripted(builder.into(), vec![]);
        let written = written.lock().unwrap();
        let pld = &written[4..];
        let rest = &pld[32..];
        assert_eq!(&rest[..5], b"root\x00");
        // zero-length token, no db (CONNECT_WITH_DB dropped)
        assert_eq!(rest[5], 0);
        assert_eq!(rest.len(), 6);
        let flags = CapabilityFlags::from_bits_truncate(LE::read_u32(&pld[..4]));
        assert!(!flags.contains(CapabilityFlags::CLIENT_CONNECT_WITH_DB));
    }

    #[test]
    fn should_fail_auth_on_err_reply() {
        let mut input = Vec::new();
        input.extend_from_slice(&frame(0, &greeting_payload()));
        input.extend_from_slice(&frame(2, &err_payload(1045, "28000", "Access denied")));
        let stream = MockStream {
            input: io::Cursor::new(input),
            written: Arc::new(Mutex::new(Vec::new())),
        };
        match Conn::with_transport(test_opts(), Box::new(stream)) {
            Err(Error::AuthError(err)) => {
                assert_eq!(err.code, 1045);
                assert_eq!(err.state, "28000");
            }
            other => panic!("expected AuthError, got {:?}", other.map(drop)),
        }
    }

    #[test]
    fn should_refuse_server_without_secure_connection() {
        let mut pld = greeting_payload();
        // drop SECURE_CONNECTION from the low capability word
        pld[27] = 0x02;
        let input = frame(0, &pld);
        let stream = MockStream {
            input: io::Cursor::new(input),
            written: Arc::new(Mutex::new(Vec::new())),
        };
        match Conn::with_transport(test_opts(), Box::new(stream)) {
            Err(Error::DriverError(DriverError::SecureConnectionNotSet)) => {}
            other => panic!("expected SecureConnectionNotSet, got {:?}", other.map(drop)),
        }
    }

    #[test]
    fn should_stream_text_result_sets() {
        let server = vec![
            frame(1, &[0x02]),
            frame(
                2,
                &column_payload("a", ColumnType::MYSQL_TYPE_LONGLONG, 0, 33),
            ),
            frame(
                3,
                &column_payload("b", ColumnType::MYSQL_TYPE_VAR_STRING, 0, 33),
            ),
            frame(4, &eof_payload()),
            frame(5, &text_row(&[Some(b"1"), Some(b"one")])),
            frame(6, &text_row(&[Some(b"2"), None])),
            frame(7, &eof_payload()),
        ];
        let (mut conn, written) = connect_scripted(test_opts(), server);
        {
            let result = conn.query("SELECT a, b FROM t").unwrap();
            assert_eq!(result.columns().len(), 2);
            let rows: Result<Vec<_>, _> = result.collect();
            let rows = rows.unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0][0], Value::Int(1));
            assert_eq!(rows[0][1], Value::Text("one".to_owned()));
            assert_eq!(rows[1][0], Value::Int(2));
            assert!(rows[1].is_null(1));
        }
        assert!(!conn.has_pending());

        // the command frame resets the sequence and carries COM_QUERY
        let written = written.lock().unwrap();
        let query_frame_start = written
            .windows(2)
            .rposition(|w| w == &[0x00, 0x03][..])
            .unwrap()
            + 1;
        assert_eq!(written[query_frame_start - 1], 0x00); // sequence 0
        assert_eq!(written[query_frame_start], 0x03);
        assert_eq!(&written[query_frame_start + 1..], b"SELECT a, b FROM t");
    }

    #[test]
    fn should_classify_exec_and_query_misuse() {
        let server = vec![
            // exec on a SELECT: result set must be purged
            frame(1, &[0x01]),
            frame(2, &column_payload("v", ColumnType::MYSQL_TYPE_LONG, 0, 33)),
            frame(3, &eof_payload()),
            frame(4, &text_row(&[Some(b"1")])),
            frame(5, &text_row(&[Some(b"2")])),
            frame(6, &eof_payload()),
            // query on an INSERT: plain OK
            frame(1, &ok_payload(2, 0)),
            // a later exec still works
            frame(1, &ok_payload(2, 7)),
        ];
        let (mut conn, _written) = connect_scripted(test_opts(), server);

        match conn.exec("SELECT v FROM t") {
            Err(Error::DriverError(DriverError::UnexpectedResultSet)) => {}
            other => panic!("expected UnexpectedResultSet, got {:?}", other),
        }
        assert!(!conn.has_pending());

        match conn.query("INSERT INTO t VALUES (1),(2)") {
            Err(Error::DriverError(DriverError::NoResultSet)) => {}
            other => panic!("expected NoResultSet, got {:?}", other.map(drop)),
        }

        assert_eq!(conn.exec("INSERT INTO t VALUES (1),(2)").unwrap(), 2);
        assert_eq!(conn.last_insert_id(), 7);
    }

    #[test]
    fn should_report_server_errors_and_stay_usable() {
        let server = vec![
            frame(1, &err_payload(1146, "42S02", "Table 't' doesn't exist")),
            frame(1, &ok_payload(0, 0)),
        ];
        let (mut conn, _) = connect_scripted(test_opts(), server);
        match conn.exec("SELECT * FROM t") {
            Err(Error::ServerError(err)) => {
                assert_eq!(err.code, 1146);
                assert_eq!(err.state, "42S02");
            }
            other => panic!("expected ServerError, got {:?}", other),
        }
        // recoverable: the next command goes through
        assert_eq!(conn.exec("DO 1").unwrap(), 0);
    }

    #[test]
    fn should_kill_connection_on_out_of_order_packet() {
        let server = vec![frame(9, &ok_payload(0, 0))];
        let (mut conn, _) = connect_scripted(test_opts(), server);
        match conn.ping() {
            Err(Error::DriverError(DriverError::PacketOutOfSync)) => {}
            other => panic!("expected PacketOutOfSync, got {:?}", other),
        }
        assert!(!conn.is_connected());
        match conn.ping() {
            Err(Error::DriverError(DriverError::ConnectionClosed)) => {}
            other => panic!("expected ConnectionClosed, got {:?}", other),
        }
    }

    #[test]
    fn should_enforce_pending_result_before_new_command() {
        let server = vec![
            frame(1, &[0x01]),
            frame(2, &column_payload("v", ColumnType::MYSQL_TYPE_LONG, 0, 33)),
            frame(3, &eof_payload()),
            frame(4, &text_row(&[Some(b"1")])),
            frame(5, &text_row(&[Some(b"2")])),
            frame(6, &text_row(&[Some(b"3")])),
            frame(7, &eof_payload()),
            frame(1, &ok_payload(1, 0)),
        ];
        let (mut conn, _) = connect_scripted(test_opts(), server);

        let result = conn.query("SELECT v FROM t").unwrap();
        std::mem::forget(result);
        assert!(conn.has_pending());

        match conn.exec("INSERT INTO t VALUES (99)") {
            Err(Error::DriverError(DriverError::DataPending)) => {}
            other => panic!("expected DataPending, got {:?}", other),
        }

        assert_eq!(conn.purge().unwrap(), 3);
        assert!(!conn.has_pending());
        assert_eq!(conn.exec("INSERT INTO t VALUES (99)").unwrap(), 1);
    }

    #[test]
    fn should_execute_prepared_statements_with_binary_rows() {
        let server = vec![
            // prepare: descriptor, one param stub + EOF, one column + EOF
            frame(1, &stmt_ok_payload(42, 1, 1)),
            frame(2, &column_payload("?", ColumnType::MYSQL_TYPE_NULL, 0, 63)),
            frame(3, &eof_payload()),
            frame(4, &column_payload("v", ColumnType::MYSQL_TYPE_LONG, 0, 33)),
            frame(5, &eof_payload()),
            // execute: headers again, then binary rows
            frame(1, &[0x01]),
            frame(2, &column_payload("v", ColumnType::MYSQL_TYPE_LONG, 0, 33)),
            frame(3, &eof_payload()),
            frame(4, &[0x00, 0x00, 0x05, 0x00, 0x00, 0x00]),
            frame(5, &[0x00, 0x04]),
            frame(6, &eof_payload()),
        ];
        let (mut conn, written) = connect_scripted(test_opts(), server);
        {
            let mut stmt = conn.prepare("SELECT v FROM t WHERE v > ?").unwrap();
            assert_eq!(stmt.id(), 42);
            assert_eq!(stmt.num_params(), 1);
            assert_eq!(stmt.num_columns(), 1);

            let result = stmt.query((3i32,)).unwrap();
            let rows: Result<Vec<_>, _> = result.collect();
            let rows = rows.unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0][0], Value::Int(5));
            assert!(rows[1].is_null(0));
        }

        // the execute packet: command, id, flags, iteration count, bitmap,
        // new-types flag, one (type, signedness) pair, one i32 value
        let written = written.lock().unwrap();
        let mut expected = vec![0x17];
        expected.write_u32::<LE>(42).unwrap();
        expected.push(0x00);
        expected.write_u32::<LE>(1).unwrap();
        expected.push(0x00); // null bitmap
        expected.push(0x01);
        expected.push(ColumnType::MYSQL_TYPE_LONG as u8);
        expected.push(0x00);
        expected.write_i32::<LE>(3).unwrap();
        let found = written
            .windows(expected.len())
            .any(|window| window == &expected[..]);
        assert!(found, "execute packet not found in client output");
    }

    #[test]
    fn should_mark_null_parameters_in_bitmap() {
        let server = vec![
            frame(1, &stmt_ok_payload(7, 0, 2)),
            frame(2, &column_payload("?", ColumnType::MYSQL_TYPE_NULL, 0, 63)),
            frame(3, &column_payload("?", ColumnType::MYSQL_TYPE_NULL, 0, 63)),
            frame(4, &eof_payload()),
            frame(1, &ok_payload(1, 0)),
        ];
        let (mut conn, written) = connect_scripted(test_opts(), server);
        {
            let mut stmt = conn.prepare("INSERT INTO t VALUES (?, ?)").unwrap();
            assert_eq!(stmt.exec((Option::<i32>::None, 5i64)).unwrap(), 1);
        }
        let written = written.lock().unwrap();
        let mut expected = vec![0x17];
        expected.write_u32::<LE>(7).unwrap();
        expected.push(0x00);
        expected.write_u32::<LE>(1).unwrap();
        expected.push(0b0000_0001); // first parameter is null
        expected.push(0x01);
        expected.push(ColumnType::MYSQL_TYPE_NULL as u8);
        expected.push(0x00);
        expected.push(ColumnType::MYSQL_TYPE_LONGLONG as u8);
        expected.push(0x00);
        expected.write_i64::<LE>(5).unwrap();
        let found = written
            .windows(expected.len())
            .any(|window| window == &expected[..]);
        assert!(found, "execute packet not found in client output");
    }

    #[test]
    fn should_release_statement_once() {
        let server = vec![frame(1, &stmt_ok_payload(9, 0, 0)), frame(1, &ok_payload(0, 0))];
        let (mut conn, written) = connect_scripted(test_opts(), server);
        {
            let mut stmt = conn.prepare("DO 1").unwrap();
            stmt.close().unwrap();
            match stmt.exec(()) {
                Err(Error::DriverError(DriverError::NotPrepared)) => {}
                other => panic!("expected NotPrepared, got {:?}", other),
            }
            // idempotent
            stmt.close().unwrap();
        }
        let written = written.lock().unwrap();
        let mut close_packet = vec![0x19];
        close_packet.write_u32::<LE>(9).unwrap();
        let count = written
            .windows(close_packet.len())
            .filter(|window| *window == &close_packet[..])
            .count();
        assert_eq!(count, 1, "COM_STMT_CLOSE must be sent exactly once");
    }

    #[test]
    fn should_send_long_data_in_chunks() {
        let server = vec![
            frame(1, &stmt_ok_payload(3, 0, 1)),
            frame(2, &column_payload("?", ColumnType::MYSQL_TYPE_NULL, 0, 63)),
            frame(3, &eof_payload()),
            frame(1, &ok_payload(1, 0)),
        ];
        let (mut conn, written) = connect_scripted(test_opts(), server);
        {
            let mut stmt = conn.prepare("INSERT INTO t VALUES (?)").unwrap();
            let mut remaining = 5000usize;
            stmt.set_long_data(0, move |buf: &mut [u8]| {
                let n = remaining.min(buf.len());
                for b in &mut buf[..n] {
                    *b = b'x';
                }
                remaining -= n;
                n
            })
            .unwrap();
            assert_eq!(stmt.exec((Vec::<u8>::new(),)).unwrap(), 1);
        }

        let written = written.lock().unwrap();
        // two long-data commands (4096 + 904 bytes), each on sequence 0
        let mut header = vec![0x18];
        header.write_u32::<LE>(3).unwrap();
        header.write_u16::<LE>(0).unwrap();
        let count = written
            .windows(header.len())
            .filter(|window| *window == &header[..])
            .count();
        assert_eq!(count, 2, "expected two COM_STMT_SEND_LONG_DATA packets");
    }

    #[test]
    fn should_accept_eof_shaped_set_option_reply() {
        let server = vec![frame(1, &eof_payload()), frame(1, &ok_payload(0, 0))];
        let (mut conn, _) = connect_scripted(test_opts(), server);
        conn.set_multi_statements(true).unwrap();
        conn.ping().unwrap();
    }

    #[test]
    fn should_return_raw_statistics_string() {
        let stats = b"Uptime: 17  Threads: 1  Questions: 2";
        let server = vec![frame(1, &stats[..])];
        let (mut conn, _) = connect_scripted(test_opts(), server);
        assert_eq!(conn.stats().unwrap(), String::from_utf8_lossy(&stats[..]));
    }

    #[test]
    fn should_reassemble_multi_frame_payloads() {
        // one logical row packet of MAX_PAYLOAD_LEN + 10 bytes
        let value_len = MAX_PAYLOAD_LEN + 1;
        let mut row = Vec::with_capacity(value_len + 9);
        row.write_lenenc_int(value_len as u64).unwrap();
        row.resize(row.len() + value_len, b'a');
        assert_eq!(row.len(), MAX_PAYLOAD_LEN + 10);

        let server = vec![
            frame(1, &[0x01]),
            frame(
                2,
                &column_payload("v", ColumnType::MYSQL_TYPE_LONG_BLOB, 0, 33),
            ),
            frame(3, &eof_payload()),
            frame(4, &row[..MAX_PAYLOAD_LEN]),
            frame(5, &row[MAX_PAYLOAD_LEN..]),
            frame(6, &eof_payload()),
        ];
        let (mut conn, _) = connect_scripted(test_opts(), server);
        let result = conn.query("SELECT v FROM t").unwrap();
        let rows: Result<Vec<_>, _> = result.collect();
        let rows = rows.unwrap();
        assert_eq!(rows.len(), 1);
        match &rows[0][0] {
            Value::Text(s) => assert_eq!(s.len(), value_len),
            other => panic!("expected Text, got {:?}", other),
        }
    }

    #[test]
    fn should_split_large_outgoing_payloads() {
        let (mut conn, written) = connect_scripted(test_opts(), vec![frame(2, &ok_payload(0, 0))]);
        let sql = "a".repeat(MAX_PAYLOAD_LEN + 5);
        assert_eq!(conn.exec(&sql).unwrap(), 0);

        let written = written.lock().unwrap();
        // skip the login packet, then expect two frames: MAX + 6 bytes
        let login_len = 4 + LE::read_u24(&written[..3]) as usize;
        let rest = &written[login_len..];
        assert_eq!(LE::read_u24(&rest[..3]) as usize, MAX_PAYLOAD_LEN);
        assert_eq!(rest[3], 0);
        let second = &rest[4 + MAX_PAYLOAD_LEN..];
        assert_eq!(LE::read_u24(&second[..3]) as usize, 6);
        assert_eq!(second[3], 1);
    }

    #[test]
    fn should_buffer_result_sets() {
        let server = vec![
            frame(1, &[0x01]),
            frame(2, &column_payload("v", ColumnType::MYSQL_TYPE_LONG, 0, 33)),
            frame(3, &eof_payload()),
            frame(4, &text_row(&[Some(b"10")])),
            frame(5, &text_row(&[Some(b"20")])),
            frame(6, &eof_payload()),
        ];
        let (mut conn, _) = connect_scripted(test_opts(), server);
        let set = conn.query("SELECT v FROM t").unwrap().into_set().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set[0][0], Value::Int(10));
        assert_eq!(set[1][0], Value::Int(20));
        assert_eq!(set.get(2), None);
        assert!(!conn.has_pending());
    }
}

#[cfg(test)]
mod live_test {
    //! End-to-end tests against a real server. Ignored by default; run with
    //! `DATABASE_DSN=... cargo test -- --ignored`.

    use crate::conn::Conn;
    use crate::error::{DriverError, Error};
    use crate::test_misc::get_opts;
    use crate::value::Value;

    #[test]
    #[ignore]
    fn should_connect_and_list_databases() {
        let mut conn = Conn::new(get_opts()).unwrap();
        assert!(!conn.server_version().is_empty());
        let rows = conn
            .query("SHOW DATABASES")
            .unwrap()
            .into_set()
            .unwrap();
        assert!(rows.iter().all(|row| row.len() == 1));
        assert!(rows.iter().any(|row| {
            row.get::<String>(0).map(|name| name == "information_schema") == Some(true)
        }));
    }

    #[test]
    #[ignore]
    fn should_classify_exec_misuse() {
        let mut conn = Conn::new(get_opts()).unwrap();
        conn.exec("CREATE TEMPORARY TABLE mylite_t1 (v INT)").unwrap();
        assert_eq!(
            conn.exec("INSERT INTO mylite_t1 VALUES (1),(2)").unwrap(),
            2
        );
        match conn.exec("SELECT * FROM mylite_t1") {
            Err(Error::DriverError(DriverError::UnexpectedResultSet)) => {}
            other => panic!("expected UnexpectedResultSet, got {:?}", other),
        }
        let rows = conn
            .query("SELECT * FROM mylite_t1 ORDER BY v")
            .unwrap()
            .into_set()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Value::Int(1));
        assert_eq!(rows[1][0], Value::Int(2));
    }

    #[test]
    #[ignore]
    fn should_roundtrip_null_through_prepared_statements() {
        let mut conn = Conn::new(get_opts()).unwrap();
        conn.exec("CREATE TEMPORARY TABLE mylite_t2 (v INT)").unwrap();
        {
            let mut stmt = conn.prepare("INSERT INTO mylite_t2(v) VALUES (?)").unwrap();
            stmt.exec((Option::<i32>::None,)).unwrap();
            stmt.exec((5i32,)).unwrap();
        }
        let rows = conn
            .query("SELECT v FROM mylite_t2 ORDER BY v IS NULL DESC, v")
            .unwrap()
            .into_set()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_null(0));
        assert_eq!(rows[1][0], Value::Int(5));
    }

    #[test]
    #[ignore]
    fn should_roundtrip_binary_columns() {
        let mut conn = Conn::new(get_opts()).unwrap();
        conn.exec(
            "CREATE TEMPORARY TABLE mylite_t3 (
                 b bit(1), ti tinyint, tu tinyint unsigned,
                 si smallint, su smallint unsigned,
                 i int, iu int unsigned,
                 bi bigint, bu bigint unsigned,
                 c char(10), vc varchar(50), tb tinyblob,
                 d date, t time, dt datetime,
                 dbl double, f float, n int
             )",
        )
        .unwrap();
        conn.exec(
            "INSERT INTO mylite_t3 VALUES (
                 1, -128, 255, -32768, 65535,
                 -2147483648, 4294967295,
                 -9223372036854775808, 18446744073709551615,
                 'abc', 'def', 'ghi',
                 '2007-01-01', '12:12:12', '2007-01-01 12:12:12',
                 1.5, 0.25, NULL
             )",
        )
        .unwrap();

        let check = |row: &crate::Row| {
            assert_eq!(row[0], Value::Bool(true));
            assert_eq!(row[1], Value::Int(-128));
            assert_eq!(row[2], Value::UInt(255));
            assert_eq!(row[3], Value::Int(-32768));
            assert_eq!(row[4], Value::UInt(65535));
            assert_eq!(row[5], Value::Int(-2147483648));
            assert_eq!(row[6], Value::UInt(4294967295));
            assert_eq!(row[7], Value::Int(-9223372036854775808));
            assert_eq!(row[8], Value::UInt(18446744073709551615));
            assert_eq!(row[9], Value::Text("abc".to_owned()));
            assert_eq!(row[10], Value::Text("def".to_owned()));
            assert_eq!(row[11], Value::Bytes(b"ghi".to_vec()));
            assert_eq!(row[12], Value::Date(2007, 1, 1));
            assert_eq!(row[13], Value::Time(false, 0, 12, 12, 12));
            assert_eq!(row[14], Value::DateTime(2007, 1, 1, 12, 12, 12));
            assert_eq!(row[15], Value::Double(1.5));
            assert_eq!(row[16], Value::Float(0.25));
            assert!(row.is_null(17));
        };

        let text_rows = conn
            .query("SELECT * FROM mylite_t3")
            .unwrap()
            .into_set()
            .unwrap();
        assert_eq!(text_rows.len(), 1);
        check(&text_rows[0]);

        let mut stmt = conn.prepare("SELECT * FROM mylite_t3").unwrap();
        let bin_rows = stmt.query(()).unwrap().into_set().unwrap();
        assert_eq!(bin_rows.len(), 1);
        check(&bin_rows[0]);
    }

    #[test]
    #[ignore]
    fn should_retrieve_values_across_lenenc_buckets() {
        let mut conn = Conn::new(get_opts()).unwrap();
        conn.exec("CREATE TEMPORARY TABLE mylite_t4 (v VARCHAR(255))")
            .unwrap();
        for len in &[251usize, 255] {
            let value = "x".repeat(*len);
            conn.exec("DELETE FROM mylite_t4").unwrap();
            conn.exec(&format!("INSERT INTO mylite_t4 VALUES ('{}')", value))
                .unwrap();
            let rows = conn
                .query("SELECT v FROM mylite_t4")
                .unwrap()
                .into_set()
                .unwrap();
            assert_eq!(rows[0][0], Value::Text(value));
        }
    }

    #[test]
    #[ignore]
    fn should_drain_live_cursor_on_drop() {
        let mut conn = Conn::new(get_opts()).unwrap();
        conn.exec("CREATE TEMPORARY TABLE mylite_t5 (v INT)").unwrap();
        conn.exec("INSERT INTO mylite_t5 VALUES (1),(2),(3)").unwrap();
        {
            let mut result = conn.query("SELECT v FROM mylite_t5").unwrap();
            let first = result.next().unwrap().unwrap();
            assert_eq!(first.len(), 1);
            // the cursor drains on drop here
        }
        assert_eq!(conn.exec("INSERT INTO mylite_t5 VALUES (99)").unwrap(), 1);
    }
}
