// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::borrow::Cow;
use std::io;

use byteorder::LittleEndian as LE;
use byteorder::ReadBytesExt;

use crate::consts::{self, CapabilityFlags, ColumnFlags, ColumnType, StatusFlags};
use crate::error::{DriverError, Result as MyResult, ServerError};
use crate::io::Read;

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status_flags: StatusFlags,
    pub warnings: u16,
    pub info: Vec<u8>,
}

impl OkPacket {
    pub fn from_payload(pld: &[u8]) -> io::Result<OkPacket> {
        let mut reader = pld;
        reader.read_u8()?;
        Ok(OkPacket {
            affected_rows: reader.read_lenenc_int()?,
            last_insert_id: reader.read_lenenc_int()?,
            status_flags: StatusFlags::from_bits_truncate(reader.read_u16::<LE>()?),
            warnings: reader.read_u16::<LE>()?,
            info: reader.to_vec(),
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ErrPacket {
    pub error_code: u16,
    pub sql_state: String,
    pub error_message: String,
}

impl ErrPacket {
    pub fn from_payload(pld: &[u8]) -> io::Result<ErrPacket> {
        let mut reader = pld;
        reader.read_u8()?;
        let error_code = reader.read_u16::<LE>()?;
        // The sql-state marker is absent in errors sent before the
        // handshake completes.
        let sql_state = if reader.first() == Some(&b'#') {
            reader.read_u8()?;
            let state = reader.read_fixed_bytes(5)?;
            String::from_utf8_lossy(&state).into_owned()
        } else {
            "HY000".to_owned()
        };
        Ok(ErrPacket {
            error_code,
            sql_state,
            error_message: String::from_utf8_lossy(reader).into_owned(),
        })
    }
}

impl From<ErrPacket> for ServerError {
    fn from(err: ErrPacket) -> ServerError {
        ServerError {
            code: err.error_code,
            state: err.sql_state,
            message: err.error_message,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct EofPacket {
    pub warnings: u16,
    pub status_flags: StatusFlags,
}

impl EofPacket {
    /// An EOF is wire-distinguishable from a row whose first value happens
    /// to start with 0xfe only by its payload length.
    pub fn is_eof(pld: &[u8]) -> bool {
        pld.first() == Some(&0xfe) && pld.len() < 9
    }

    pub fn from_payload(pld: &[u8]) -> io::Result<EofPacket> {
        let mut reader = pld;
        reader.read_u8()?;
        Ok(EofPacket {
            warnings: reader.read_u16::<LE>()?,
            status_flags: StatusFlags::from_bits_truncate(reader.read_u16::<LE>()?),
        })
    }
}

/// Initial greeting of a protocol-10 server.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct HandshakePacket {
    pub protocol_version: u8,
    pub server_version: String,
    pub connection_id: u32,
    pub capability_flags: CapabilityFlags,
    pub status_flags: StatusFlags,
    pub character_set: u8,
    /// Both challenge halves concatenated, trailing NUL dropped.
    pub auth_plugin_data: Vec<u8>,
}

impl HandshakePacket {
    pub fn from_payload(pld: &[u8]) -> io::Result<HandshakePacket> {
        let mut reader = pld;
        let protocol_version = reader.read_u8()?;
        let server_version = String::from_utf8_lossy(&reader.read_to_null()?).into_owned();
        let connection_id = reader.read_u32::<LE>()?;
        let mut auth_plugin_data = reader.read_fixed_bytes(8)?;
        // filler
        reader.read_u8()?;
        let lower_cf = reader.read_u16::<LE>()?;
        let character_set = reader.read_u8()?;
        let status_flags = StatusFlags::from_bits_truncate(reader.read_u16::<LE>()?);
        let upper_cf = reader.read_u16::<LE>()?;
        let capability_flags =
            CapabilityFlags::from_bits_truncate(u32::from(lower_cf) | u32::from(upper_cf) << 16);
        // Advertised challenge length; observed to be zero in the wild.
        let _scramble_len = reader.read_u8()?;
        reader.read_fixed_bytes(10)?;
        auth_plugin_data.extend_from_slice(&reader.read_to_null()?);
        Ok(HandshakePacket {
            protocol_version,
            server_version,
            connection_id,
            capability_flags,
            status_flags,
            character_set,
            auth_plugin_data,
        })
    }
}

/// Column definition as sent in result-set headers and prepare responses.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Column {
    /// Schema name.
    pub schema: Vec<u8>,
    /// Virtual table name.
    pub table: Vec<u8>,
    /// Physical table name.
    pub org_table: Vec<u8>,
    /// Virtual column name.
    pub name: Vec<u8>,
    /// Physical column name.
    pub org_name: Vec<u8>,
    /// Column character set.
    pub character_set: u16,
    /// Maximum length of the field.
    pub column_length: u32,
    /// Column type.
    pub column_type: ColumnType,
    /// Flags.
    pub flags: ColumnFlags,
    /// Max shown decimal digits.
    pub decimals: u8,
    /// Default values, sent for `COM_FIELD_LIST` responses only.
    pub default_values: Vec<u8>,
}

impl Column {
    pub fn from_payload(pld: &[u8]) -> MyResult<Column> {
        let mut reader = pld;
        // Skip catalog
        let _ = reader.read_lenenc_bytes()?;
        let schema = reader.read_lenenc_bytes()?;
        let table = reader.read_lenenc_bytes()?;
        let org_table = reader.read_lenenc_bytes()?;
        let name = reader.read_lenenc_bytes()?;
        let org_name = reader.read_lenenc_bytes()?;
        // Length of the fixed-size tail, always 0x0c
        let _ = reader.read_lenenc_int()?;
        let character_set = reader.read_u16::<LE>()?;
        let column_length = reader.read_u32::<LE>()?;
        let type_code = reader.read_u8()?;
        let column_type =
            ColumnType::from_u8(type_code).ok_or(DriverError::UnknownColumnType(type_code))?;
        let flags = ColumnFlags::from_bits_truncate(reader.read_u16::<LE>()?);
        let decimals = reader.read_u8()?;
        // filler
        reader.read_fixed_bytes(2)?;
        let default_values = if reader.is_empty() {
            Vec::new()
        } else {
            reader.read_lenenc_bytes()?
        };
        Ok(Column {
            schema,
            table,
            org_table,
            name,
            org_name,
            character_set,
            column_length,
            column_type,
            flags,
            decimals,
            default_values,
        })
    }

    pub fn name_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED_FLAG)
    }

    pub fn is_binary(&self) -> bool {
        self.character_set == consts::BINARY_CHARSET
    }
}
