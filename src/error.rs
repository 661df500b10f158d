// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::{error, fmt, io, result};

use crate::consts::ColumnType;

pub type Result<T> = result::Result<T, Error>;

/// An error reported by the server, either mid-session (`Error::ServerError`)
/// or during handshake/login (`Error::AuthError`).
#[derive(Eq, PartialEq, Clone)]
pub struct ServerError {
    pub code: u16,
    pub state: String,
    pub message: String,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR {} ({}): {}", self.code, self.state, self.message)
    }
}

impl fmt::Debug for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl error::Error for ServerError {}

pub enum Error {
    IoError(io::Error),
    DriverError(DriverError),
    ServerError(ServerError),
    AuthError(ServerError),
    DsnError(DsnError),
}

impl Error {
    /// Whether this error leaves the connection's wire state unusable.
    ///
    /// A fatal error means the packet stream can no longer be trusted, so
    /// the connection is killed before the error propagates. Server errors
    /// and usage errors leave the connection usable.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::IoError(_) => true,
            Error::DriverError(ref err) => err.is_fatal(),
            Error::ServerError(_) | Error::AuthError(_) | Error::DsnError(_) => false,
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            Error::DriverError(ref err) => Some(err),
            Error::ServerError(ref err) => Some(err),
            Error::AuthError(ref err) => Some(err),
            Error::DsnError(ref err) => Some(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => write!(f, "IoError {{ {} }}", err),
            Error::DriverError(ref err) => write!(f, "DriverError {{ {} }}", err),
            Error::ServerError(ref err) => write!(f, "ServerError {{ {} }}", err),
            Error::AuthError(ref err) => write!(f, "AuthError {{ {} }}", err),
            Error::DsnError(ref err) => write!(f, "DsnError {{ {} }}", err),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<DriverError> for Error {
    fn from(err: DriverError) -> Error {
        Error::DriverError(err)
    }
}

impl From<ServerError> for Error {
    fn from(err: ServerError) -> Error {
        Error::ServerError(err)
    }
}

impl From<DsnError> for Error {
    fn from(err: DsnError) -> Error {
        Error::DsnError(err)
    }
}

#[derive(Eq, PartialEq, Clone)]
pub enum DriverError {
    // (address, description)
    CouldNotConnect(String, String),
    ConnectionClosed,
    UnsupportedProtocol(u8),
    Protocol41NotSet,
    SecureConnectionNotSet,
    PacketOutOfSync,
    UnexpectedPacket,
    MalformedPacket,
    UnknownColumnType(u8),
    DataPending,
    NotPrepared,
    UnexpectedResultSet,
    NoResultSet,
    MismatchedStmtParams(u16, usize),
    UnsupportedParameter(ColumnType),
}

impl DriverError {
    fn is_fatal(&self) -> bool {
        match *self {
            DriverError::CouldNotConnect(..)
            | DriverError::UnsupportedProtocol(_)
            | DriverError::Protocol41NotSet
            | DriverError::SecureConnectionNotSet
            | DriverError::PacketOutOfSync
            | DriverError::UnexpectedPacket
            | DriverError::MalformedPacket
            | DriverError::UnknownColumnType(_) => true,
            DriverError::ConnectionClosed
            | DriverError::DataPending
            | DriverError::NotPrepared
            | DriverError::UnexpectedResultSet
            | DriverError::NoResultSet
            | DriverError::MismatchedStmtParams(..)
            | DriverError::UnsupportedParameter(_) => false,
        }
    }
}

impl error::Error for DriverError {}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DriverError::CouldNotConnect(ref addr, ref desc) => {
                write!(f, "Could not connect to address `{}': {}", addr, desc)
            }
            DriverError::ConnectionClosed => write!(f, "Connection to the server is closed"),
            DriverError::UnsupportedProtocol(version) => {
                write!(f, "Unsupported protocol version {}", version)
            }
            DriverError::Protocol41NotSet => write!(f, "Server must set CLIENT_PROTOCOL_41 flag"),
            DriverError::SecureConnectionNotSet => {
                write!(f, "Server must set CLIENT_SECURE_CONNECTION flag")
            }
            DriverError::PacketOutOfSync => write!(f, "Server packet out of order"),
            DriverError::UnexpectedPacket => write!(f, "Unexpected packet"),
            DriverError::MalformedPacket => write!(f, "Malformed packet"),
            DriverError::UnknownColumnType(code) => write!(f, "Unknown column type {}", code),
            DriverError::DataPending => {
                write!(f, "Previous result must be consumed before a new command")
            }
            DriverError::NotPrepared => write!(f, "Statement has been released"),
            DriverError::UnexpectedResultSet => {
                write!(f, "Statement produced a result set where none was expected")
            }
            DriverError::NoResultSet => write!(f, "Statement produced no result set"),
            DriverError::MismatchedStmtParams(exp, prov) => write!(
                f,
                "Statement takes {} parameters but {} was supplied",
                exp, prov
            ),
            DriverError::UnsupportedParameter(coltype) => {
                write!(f, "Unsupported parameter type {:?}", coltype)
            }
        }
    }
}

impl fmt::Debug for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Eq, PartialEq, Clone)]
pub enum DsnError {
    UnknownParameter(String),
    /// (parameter_name, value)
    InvalidValue(String, String),
    BadPair(String),
}

impl error::Error for DsnError {}

impl fmt::Display for DsnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DsnError::UnknownParameter(ref name) => {
                write!(f, "Unknown connection string parameter `{}'", name)
            }
            DsnError::InvalidValue(ref name, ref value) => {
                write!(f, "Invalid value `{}' for parameter `{}'", value, name)
            }
            DsnError::BadPair(ref pair) => {
                write!(f, "Expected `key=value', got `{}'", pair)
            }
        }
    }
}

impl fmt::Debug for DsnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
