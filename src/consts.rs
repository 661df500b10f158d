// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use bitflags::bitflags;

/// Maximum payload of a single physical packet. A logical payload of this
/// exact size continues in the next frame.
pub const MAX_PAYLOAD_LEN: usize = 16_777_215;

pub const UTF8_GENERAL_CI: u8 = 33;

/// Character set id the server uses to mark binary (non-text) string data.
pub const BINARY_CHARSET: u16 = 63;

/// Server status flags
bitflags! {
    pub struct StatusFlags: u16 {
        const SERVER_STATUS_IN_TRANS             = 0x0001;
        const SERVER_STATUS_AUTOCOMMIT           = 0x0002;
        const SERVER_MORE_RESULTS_EXISTS         = 0x0008;
        const SERVER_STATUS_NO_GOOD_INDEX_USED   = 0x0010;
        const SERVER_STATUS_NO_INDEX_USED        = 0x0020;
        const SERVER_STATUS_CURSOR_EXISTS        = 0x0040;
        const SERVER_STATUS_LAST_ROW_SENT        = 0x0080;
        const SERVER_STATUS_DB_DROPPED           = 0x0100;
        const SERVER_STATUS_NO_BACKSLASH_ESCAPES = 0x0200;
        const SERVER_STATUS_METADATA_CHANGED     = 0x0400;
        const SERVER_QUERY_WAS_SLOW              = 0x0800;
        const SERVER_PT_OUT_PARAMS               = 0x1000;
    }
}

/// Capability flags (u32)
bitflags! {
    pub struct CapabilityFlags: u32 {
        const CLIENT_LONG_PASSWORD                  = 0x00000001;
        const CLIENT_FOUND_ROWS                     = 0x00000002;
        const CLIENT_LONG_FLAG                      = 0x00000004;
        const CLIENT_CONNECT_WITH_DB                = 0x00000008;
        const CLIENT_NO_SCHEMA                      = 0x00000010;
        const CLIENT_COMPRESS                       = 0x00000020;
        const CLIENT_ODBC                           = 0x00000040;
        const CLIENT_LOCAL_FILES                    = 0x00000080;
        const CLIENT_IGNORE_SPACE                   = 0x00000100;
        const CLIENT_PROTOCOL_41                    = 0x00000200;
        const CLIENT_INTERACTIVE                    = 0x00000400;
        const CLIENT_SSL                            = 0x00000800;
        const CLIENT_IGNORE_SIGPIPE                 = 0x00001000;
        const CLIENT_TRANSACTIONS                   = 0x00002000;
        const CLIENT_RESERVED                       = 0x00004000;
        const CLIENT_SECURE_CONNECTION              = 0x00008000;
        const CLIENT_MULTI_STATEMENTS               = 0x00010000;
        const CLIENT_MULTI_RESULTS                  = 0x00020000;
        const CLIENT_PS_MULTI_RESULTS               = 0x00040000;
        const CLIENT_PLUGIN_AUTH                    = 0x00080000;
        const CLIENT_CONNECT_ATTRS                  = 0x00100000;
        const CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA = 0x00200000;
    }
}

/// Column flags (u16)
bitflags! {
    pub struct ColumnFlags: u16 {
        const NOT_NULL_FLAG         = 1;
        const PRI_KEY_FLAG          = 2;
        const UNIQUE_KEY_FLAG       = 4;
        const MULTIPLE_KEY_FLAG     = 8;
        const BLOB_FLAG             = 16;
        const UNSIGNED_FLAG         = 32;
        const ZEROFILL_FLAG         = 64;
        const BINARY_FLAG           = 128;
        const ENUM_FLAG             = 256;
        const AUTO_INCREMENT_FLAG   = 512;
        const TIMESTAMP_FLAG        = 1024;
        const SET_FLAG              = 2048;
        const NO_DEFAULT_VALUE_FLAG = 4096;
        const ON_UPDATE_NOW_FLAG    = 8192;
        const PART_KEY_FLAG         = 16384;
        const NUM_FLAG              = 32768;
    }
}

/// `COM_REFRESH` sub-command flags (u8)
bitflags! {
    pub struct RefreshFlags: u8 {
        const REFRESH_GRANT   = 0x01;
        const REFRESH_LOG     = 0x02;
        const REFRESH_TABLES  = 0x04;
        const REFRESH_HOSTS   = 0x08;
        const REFRESH_STATUS  = 0x10;
        const REFRESH_THREADS = 0x20;
        const REFRESH_SLAVE   = 0x40;
        const REFRESH_MASTER  = 0x80;
    }
}

/// Commands (u8)
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Command {
    COM_SLEEP               = 0x00,
    COM_QUIT                = 0x01,
    COM_INIT_DB             = 0x02,
    COM_QUERY               = 0x03,
    COM_FIELD_LIST          = 0x04,
    COM_CREATE_DB           = 0x05,
    COM_DROP_DB             = 0x06,
    COM_REFRESH             = 0x07,
    COM_SHUTDOWN            = 0x08,
    COM_STATISTICS          = 0x09,
    COM_PROCESS_INFO        = 0x0a,
    COM_CONNECT             = 0x0b,
    COM_PROCESS_KILL        = 0x0c,
    COM_DEBUG               = 0x0d,
    COM_PING                = 0x0e,
    COM_TIME                = 0x0f,
    COM_DELAYED_INSERT      = 0x10,
    COM_CHANGE_USER         = 0x11,
    COM_BINLOG_DUMP         = 0x12,
    COM_TABLE_DUMP          = 0x13,
    COM_CONNECT_OUT         = 0x14,
    COM_REGISTER_SLAVE      = 0x15,
    COM_STMT_PREPARE        = 0x16,
    COM_STMT_EXECUTE        = 0x17,
    COM_STMT_SEND_LONG_DATA = 0x18,
    COM_STMT_CLOSE          = 0x19,
    COM_STMT_RESET          = 0x1a,
    COM_SET_OPTION          = 0x1b,
    COM_STMT_FETCH          = 0x1c,
    COM_DAEMON              = 0x1d,
    COM_BINLOG_DUMP_GTID    = 0x1e,
    COM_RESET_CONNECTION    = 0x1f,
}

/// Column types (u8)
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum ColumnType {
    MYSQL_TYPE_DECIMAL     = 0x00,
    MYSQL_TYPE_TINY        = 0x01,
    MYSQL_TYPE_SHORT       = 0x02,
    MYSQL_TYPE_LONG        = 0x03,
    MYSQL_TYPE_FLOAT       = 0x04,
    MYSQL_TYPE_DOUBLE      = 0x05,
    MYSQL_TYPE_NULL        = 0x06,
    MYSQL_TYPE_TIMESTAMP   = 0x07,
    MYSQL_TYPE_LONGLONG    = 0x08,
    MYSQL_TYPE_INT24       = 0x09,
    MYSQL_TYPE_DATE        = 0x0a,
    MYSQL_TYPE_TIME        = 0x0b,
    MYSQL_TYPE_DATETIME    = 0x0c,
    MYSQL_TYPE_YEAR        = 0x0d,
    MYSQL_TYPE_NEWDATE     = 0x0e,
    MYSQL_TYPE_VARCHAR     = 0x0f,
    MYSQL_TYPE_BIT         = 0x10,
    MYSQL_TYPE_NEWDECIMAL  = 0xf6,
    MYSQL_TYPE_ENUM        = 0xf7,
    MYSQL_TYPE_SET         = 0xf8,
    MYSQL_TYPE_TINY_BLOB   = 0xf9,
    MYSQL_TYPE_MEDIUM_BLOB = 0xfa,
    MYSQL_TYPE_LONG_BLOB   = 0xfb,
    MYSQL_TYPE_BLOB        = 0xfc,
    MYSQL_TYPE_VAR_STRING  = 0xfd,
    MYSQL_TYPE_STRING      = 0xfe,
    MYSQL_TYPE_GEOMETRY    = 0xff,
}

impl ColumnType {
    pub fn from_u8(x: u8) -> Option<ColumnType> {
        match x {
            0x00 => Some(ColumnType::MYSQL_TYPE_DECIMAL),
            0x01 => Some(ColumnType::MYSQL_TYPE_TINY),
            0x02 => Some(ColumnType::MYSQL_TYPE_SHORT),
            0x03 => Some(ColumnType::MYSQL_TYPE_LONG),
            0x04 => Some(ColumnType::MYSQL_TYPE_FLOAT),
            0x05 => Some(ColumnType::MYSQL_TYPE_DOUBLE),
            0x06 => Some(ColumnType::MYSQL_TYPE_NULL),
            0x07 => Some(ColumnType::MYSQL_TYPE_TIMESTAMP),
            0x08 => Some(ColumnType::MYSQL_TYPE_LONGLONG),
            0x09 => Some(ColumnType::MYSQL_TYPE_INT24),
            0x0a => Some(ColumnType::MYSQL_TYPE_DATE),
            0x0b => Some(ColumnType::MYSQL_TYPE_TIME),
            0x0c => Some(ColumnType::MYSQL_TYPE_DATETIME),
            0x0d => Some(ColumnType::MYSQL_TYPE_YEAR),
            0x0e => Some(ColumnType::MYSQL_TYPE_NEWDATE),
            0x0f => Some(ColumnType::MYSQL_TYPE_VARCHAR),
            0x10 => Some(ColumnType::MYSQL_TYPE_BIT),
            0xf6 => Some(ColumnType::MYSQL_TYPE_NEWDECIMAL),
            0xf7 => Some(ColumnType::MYSQL_TYPE_ENUM),
            0xf8 => Some(ColumnType::MYSQL_TYPE_SET),
            0xf9 => Some(ColumnType::MYSQL_TYPE_TINY_BLOB),
            0xfa => Some(ColumnType::MYSQL_TYPE_MEDIUM_BLOB),
            0xfb => Some(ColumnType::MYSQL_TYPE_LONG_BLOB),
            0xfc => Some(ColumnType::MYSQL_TYPE_BLOB),
            0xfd => Some(ColumnType::MYSQL_TYPE_VAR_STRING),
            0xfe => Some(ColumnType::MYSQL_TYPE_STRING),
            0xff => Some(ColumnType::MYSQL_TYPE_GEOMETRY),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_convert_column_type_codes() {
        assert_eq!(ColumnType::from_u8(0x00), Some(ColumnType::MYSQL_TYPE_DECIMAL));
        assert_eq!(ColumnType::from_u8(0x0e), Some(ColumnType::MYSQL_TYPE_NEWDATE));
        assert_eq!(ColumnType::from_u8(0xfc), Some(ColumnType::MYSQL_TYPE_BLOB));
        assert_eq!(ColumnType::from_u8(0xff), Some(ColumnType::MYSQL_TYPE_GEOMETRY));
        assert_eq!(ColumnType::from_u8(0x11), None);
        assert_eq!(ColumnType::from_u8(0xf5), None);
    }
}
