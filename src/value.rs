// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::io;
use std::str;
use std::str::FromStr;
use std::time::Duration;

use byteorder::LittleEndian as LE;
use byteorder::{ReadBytesExt, WriteBytesExt};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use lazy_static::lazy_static;
use regex::Regex;

use crate::consts::ColumnType;
use crate::error::{DriverError, Result as MyResult};
use crate::io::{Read, Write};
use crate::packet::Column;

lazy_static! {
    static ref DATE_RE_YMD: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap();
    static ref DATETIME_RE_YMD_HMS: Regex =
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2}):(\d{2})(\.\d{1,6})?$").unwrap();
    static ref TIME_RE_HHH_MM_SS: Regex =
        Regex::new(r"^(-)?(\d{2,3}):([0-5]\d):([0-5]\d)(\.\d{1,6})?$").unwrap();
}

/// `Value` enumerates possible values in mysql cells. Also `Value` is used to
/// fill prepared statement parameters.
///
/// SQL NULL is carried natively as `Value::NULL`; accessing a NULL column
/// yields it directly.
#[derive(Clone, PartialEq, PartialOrd, Debug)]
pub enum Value {
    NULL,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    Text(String),
    /// year, month, day
    Date(u16, u8, u8),
    /// is negative, days, hours, minutes, seconds
    Time(bool, u32, u8, u8, u8),
    /// year, month, day, hour, minutes, seconds
    DateTime(u16, u8, u8, u8, u8, u8),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(*self, Value::NULL)
    }

    /// Correct string representation of a mysql value for use in a query
    /// text.
    pub fn into_str(&self) -> String {
        match *self {
            Value::NULL => "NULL".to_owned(),
            Value::Bool(x) => (if x { "1" } else { "0" }).to_owned(),
            Value::Int(x) => format!("{}", x),
            Value::UInt(x) => format!("{}", x),
            Value::Float(x) => format!("{}", x),
            Value::Double(x) => format!("{}", x),
            Value::Bytes(ref bytes) => match str::from_utf8(bytes) {
                Ok(s) => escaped(s),
                Err(_) => {
                    let mut s = "0x".to_owned();
                    for c in bytes.iter() {
                        s.extend(format!("{:02X}", *c).chars());
                    }
                    s
                }
            },
            Value::Text(ref s) => escaped(s),
            Value::Date(y, m, d) => format!("'{:04}-{:02}-{:02}'", y, m, d),
            Value::DateTime(y, m, d, h, i, s) => {
                format!("'{:04}-{:02}-{:02} {:02}:{:02}:{:02}'", y, m, d, h, i, s)
            }
            Value::Time(neg, d, h, i, s) => {
                let sign = if neg { "-" } else { "" };
                format!("'{}{:03}:{:02}:{:02}'", sign, d * 24 + u32::from(h), i, s)
            }
        }
    }

    /// Builds a value out of one text-protocol cell.
    pub(crate) fn from_text(input: Vec<u8>, column: &Column) -> MyResult<Value> {
        use crate::consts::ColumnType::*;
        match column.column_type {
            MYSQL_TYPE_NULL => Ok(Value::NULL),
            MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_LONG | MYSQL_TYPE_INT24
            | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR => {
                let s = text_str(&input)?;
                if column.is_unsigned() {
                    u64::from_str(s)
                        .map(Value::UInt)
                        .map_err(|_| DriverError::MalformedPacket.into())
                } else {
                    i64::from_str(s)
                        .map(Value::Int)
                        .map_err(|_| DriverError::MalformedPacket.into())
                }
            }
            MYSQL_TYPE_FLOAT => {
                let s = text_str(&input)?;
                f32::from_str(s)
                    .map(Value::Float)
                    .map_err(|_| DriverError::MalformedPacket.into())
            }
            MYSQL_TYPE_DOUBLE => {
                let s = text_str(&input)?;
                f64::from_str(s)
                    .map(Value::Double)
                    .map_err(|_| DriverError::MalformedPacket.into())
            }
            MYSQL_TYPE_DATE => parse_text_date(text_str(&input)?),
            MYSQL_TYPE_DATETIME | MYSQL_TYPE_TIMESTAMP => parse_text_datetime(text_str(&input)?),
            MYSQL_TYPE_TIME => parse_text_time(text_str(&input)?),
            _ => Value::from_opaque(input, column),
        }
    }

    /// Interprets a length-coded cell body. Shared by the text protocol and
    /// the string-shaped binary types, so both protocols agree on the host
    /// value.
    pub(crate) fn from_opaque(input: Vec<u8>, column: &Column) -> MyResult<Value> {
        use crate::consts::ColumnType::*;
        match column.column_type {
            MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL => {
                let s = text_str(&input)?;
                f64::from_str(s)
                    .map(Value::Double)
                    .map_err(|_| DriverError::MalformedPacket.into())
            }
            MYSQL_TYPE_BIT if input.len() == 1 => Ok(Value::Bool(input[0] != 0)),
            MYSQL_TYPE_BIT | MYSQL_TYPE_NEWDATE | MYSQL_TYPE_GEOMETRY => Ok(Value::Bytes(input)),
            _ => {
                if column.is_binary() {
                    Ok(Value::Bytes(input))
                } else {
                    match String::from_utf8(input) {
                        Ok(s) => Ok(Value::Text(s)),
                        Err(err) => Ok(Value::Bytes(err.into_bytes())),
                    }
                }
            }
        }
    }

    /// Reads one binary-protocol cell.
    pub(crate) fn from_bin(reader: &mut &[u8], column: &Column) -> MyResult<Value> {
        use crate::consts::ColumnType::*;
        let unsigned = column.is_unsigned();
        match column.column_type {
            MYSQL_TYPE_STRING | MYSQL_TYPE_VAR_STRING | MYSQL_TYPE_VARCHAR | MYSQL_TYPE_BLOB
            | MYSQL_TYPE_TINY_BLOB | MYSQL_TYPE_MEDIUM_BLOB | MYSQL_TYPE_LONG_BLOB
            | MYSQL_TYPE_SET | MYSQL_TYPE_ENUM | MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL
            | MYSQL_TYPE_BIT | MYSQL_TYPE_NEWDATE | MYSQL_TYPE_GEOMETRY => {
                let bytes = reader.read_lenenc_bytes()?;
                Value::from_opaque(bytes, column)
            }
            MYSQL_TYPE_TINY => {
                if unsigned {
                    Ok(Value::UInt(u64::from(reader.read_u8()?)))
                } else {
                    Ok(Value::Int(i64::from(reader.read_i8()?)))
                }
            }
            MYSQL_TYPE_SHORT | MYSQL_TYPE_YEAR => {
                if unsigned {
                    Ok(Value::UInt(u64::from(reader.read_u16::<LE>()?)))
                } else {
                    Ok(Value::Int(i64::from(reader.read_i16::<LE>()?)))
                }
            }
            MYSQL_TYPE_LONG | MYSQL_TYPE_INT24 => {
                if unsigned {
                    Ok(Value::UInt(u64::from(reader.read_u32::<LE>()?)))
                } else {
                    Ok(Value::Int(i64::from(reader.read_i32::<LE>()?)))
                }
            }
            MYSQL_TYPE_LONGLONG => {
                if unsigned {
                    Ok(Value::UInt(reader.read_u64::<LE>()?))
                } else {
                    Ok(Value::Int(reader.read_i64::<LE>()?))
                }
            }
            MYSQL_TYPE_FLOAT => Ok(Value::Float(reader.read_f32::<LE>()?)),
            MYSQL_TYPE_DOUBLE => Ok(Value::Double(reader.read_f64::<LE>()?)),
            MYSQL_TYPE_DATE => {
                let (y, m, d, ..) = read_bin_datetime(reader)?;
                Ok(Value::Date(y, m, d))
            }
            MYSQL_TYPE_TIMESTAMP | MYSQL_TYPE_DATETIME => {
                let (y, mo, d, h, mi, s) = read_bin_datetime(reader)?;
                Ok(Value::DateTime(y, mo, d, h, mi, s))
            }
            MYSQL_TYPE_TIME => {
                let (neg, d, h, m, s) = read_bin_time(reader)?;
                Ok(Value::Time(neg, d, h, m, s))
            }
            MYSQL_TYPE_NULL => Ok(Value::NULL),
        }
    }

    /// Parses one text-protocol row.
    pub(crate) fn from_payload(pld: &[u8], columns: &[Column]) -> MyResult<Vec<Value>> {
        let mut output = Vec::with_capacity(columns.len());
        let mut reader = pld;
        for column in columns {
            if reader.first() == Some(&0xfb) {
                reader.read_u8()?;
                output.push(Value::NULL);
            } else {
                let bytes = reader.read_lenenc_bytes()?;
                output.push(Value::from_text(bytes, column)?);
            }
        }
        if reader.is_empty() {
            Ok(output)
        } else {
            Err(DriverError::MalformedPacket.into())
        }
    }

    /// Parses one binary-protocol row.
    pub(crate) fn from_bin_payload(pld: &[u8], columns: &[Column]) -> MyResult<Vec<Value>> {
        let mut reader = pld;
        if reader.read_u8()? != 0x00 {
            return Err(DriverError::MalformedPacket.into());
        }
        // Two reserved bits at the front of the bitmap.
        let bit_offset = 2;
        let bitmap_len = (columns.len() + 7 + bit_offset) / 8;
        let bitmap = reader.read_fixed_bytes(bitmap_len)?;
        let mut values = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if bitmap[(i + bit_offset) / 8] & (1 << ((i + bit_offset) % 8)) == 0 {
                values.push(Value::from_bin(&mut reader, column)?);
            } else {
                values.push(Value::NULL);
            }
        }
        Ok(values)
    }

    /// Writes this value in the on-wire binary encoding of the declared
    /// parameter type.
    pub(crate) fn write_bin(
        &self,
        writer: &mut Vec<u8>,
        coltype: ColumnType,
        _unsigned: bool,
    ) -> MyResult<()> {
        use crate::consts::ColumnType::*;
        match (coltype, self) {
            (MYSQL_TYPE_NULL, _) => Ok(()),
            (MYSQL_TYPE_BIT, &Value::Bool(x)) => {
                writer.write_lenenc_bytes(if x { b"1" } else { b"0" })?;
                Ok(())
            }
            (MYSQL_TYPE_TINY, &Value::Int(x)) => Ok(writer.write_i8(x as i8)?),
            (MYSQL_TYPE_TINY, &Value::UInt(x)) => Ok(writer.write_u8(x as u8)?),
            (MYSQL_TYPE_SHORT, &Value::Int(x)) => Ok(writer.write_i16::<LE>(x as i16)?),
            (MYSQL_TYPE_SHORT, &Value::UInt(x)) => Ok(writer.write_u16::<LE>(x as u16)?),
            (MYSQL_TYPE_LONG, &Value::Int(x)) | (MYSQL_TYPE_INT24, &Value::Int(x)) => {
                Ok(writer.write_i32::<LE>(x as i32)?)
            }
            (MYSQL_TYPE_LONG, &Value::UInt(x)) | (MYSQL_TYPE_INT24, &Value::UInt(x)) => {
                Ok(writer.write_u32::<LE>(x as u32)?)
            }
            (MYSQL_TYPE_LONGLONG, &Value::Int(x)) => Ok(writer.write_i64::<LE>(x)?),
            (MYSQL_TYPE_LONGLONG, &Value::UInt(x)) => Ok(writer.write_u64::<LE>(x)?),
            (MYSQL_TYPE_FLOAT, &Value::Float(x)) => Ok(writer.write_f32::<LE>(x)?),
            (MYSQL_TYPE_DOUBLE, &Value::Double(x)) => Ok(writer.write_f64::<LE>(x)?),
            (MYSQL_TYPE_DATE, &Value::Date(y, m, d)) => Ok(write_bin_date(writer, y, m, d)?),
            (MYSQL_TYPE_DATETIME, &Value::Date(y, m, d))
            | (MYSQL_TYPE_TIMESTAMP, &Value::Date(y, m, d)) => {
                Ok(write_bin_datetime(writer, y, m, d, 0, 0, 0)?)
            }
            (MYSQL_TYPE_DATETIME, &Value::DateTime(y, mo, d, h, mi, s))
            | (MYSQL_TYPE_TIMESTAMP, &Value::DateTime(y, mo, d, h, mi, s)) => {
                Ok(write_bin_datetime(writer, y, mo, d, h, mi, s)?)
            }
            (MYSQL_TYPE_TIME, &Value::Time(neg, d, h, m, s)) => {
                Ok(write_bin_time(writer, neg, d, h, m, s)?)
            }
            (MYSQL_TYPE_VARCHAR, &Value::Text(ref s))
            | (MYSQL_TYPE_VAR_STRING, &Value::Text(ref s))
            | (MYSQL_TYPE_STRING, &Value::Text(ref s)) => {
                Ok(writer.write_lenenc_bytes(s.as_bytes())?)
            }
            (MYSQL_TYPE_VARCHAR, &Value::Bytes(ref b))
            | (MYSQL_TYPE_VAR_STRING, &Value::Bytes(ref b))
            | (MYSQL_TYPE_STRING, &Value::Bytes(ref b)) => Ok(writer.write_lenenc_bytes(b)?),
            (MYSQL_TYPE_TINY_BLOB, &Value::Bytes(ref b))
            | (MYSQL_TYPE_BLOB, &Value::Bytes(ref b))
            | (MYSQL_TYPE_MEDIUM_BLOB, &Value::Bytes(ref b))
            | (MYSQL_TYPE_LONG_BLOB, &Value::Bytes(ref b)) => Ok(writer.write_lenenc_bytes(b)?),
            (MYSQL_TYPE_TINY_BLOB, &Value::Text(ref s))
            | (MYSQL_TYPE_BLOB, &Value::Text(ref s))
            | (MYSQL_TYPE_MEDIUM_BLOB, &Value::Text(ref s))
            | (MYSQL_TYPE_LONG_BLOB, &Value::Text(ref s)) => {
                Ok(writer.write_lenenc_bytes(s.as_bytes())?)
            }
            _ => Err(DriverError::UnsupportedParameter(coltype).into()),
        }
    }
}

fn escaped(input: &str) -> String {
    let replaced = input
        .replace('\x5c', "\x5c\x5c")
        .replace('\x00', "\x5c\x00")
        .replace('\n', "\x5c\n")
        .replace('\r', "\x5c\r")
        .replace('\'', "\x5c'")
        .replace('"', "\x5c\"")
        .replace('\x1a', "\x5c\x1a");
    format!("'{}'", replaced)
}

fn text_str(input: &[u8]) -> MyResult<&str> {
    str::from_utf8(input).map_err(|_| DriverError::MalformedPacket.into())
}

fn parse_text_date(s: &str) -> MyResult<Value> {
    match DATE_RE_YMD.captures(s) {
        Some(caps) => Ok(Value::Date(
            parse_num(&caps[1])? as u16,
            parse_num(&caps[2])? as u8,
            parse_num(&caps[3])? as u8,
        )),
        None => Err(DriverError::MalformedPacket.into()),
    }
}

fn parse_text_datetime(s: &str) -> MyResult<Value> {
    match DATETIME_RE_YMD_HMS.captures(s) {
        Some(caps) => Ok(Value::DateTime(
            parse_num(&caps[1])? as u16,
            parse_num(&caps[2])? as u8,
            parse_num(&caps[3])? as u8,
            parse_num(&caps[4])? as u8,
            parse_num(&caps[5])? as u8,
            parse_num(&caps[6])? as u8,
        )),
        None => Err(DriverError::MalformedPacket.into()),
    }
}

fn parse_text_time(s: &str) -> MyResult<Value> {
    match TIME_RE_HHH_MM_SS.captures(s) {
        Some(caps) => {
            let neg = caps.get(1).is_some();
            let hours = parse_num(&caps[2])? as u32;
            Ok(Value::Time(
                neg,
                hours / 24,
                (hours % 24) as u8,
                parse_num(&caps[3])? as u8,
                parse_num(&caps[4])? as u8,
            ))
        }
        None => Err(DriverError::MalformedPacket.into()),
    }
}

fn parse_num(s: &str) -> MyResult<u64> {
    u64::from_str(s).map_err(|_| DriverError::MalformedPacket.into())
}

fn read_bin_datetime(reader: &mut &[u8]) -> io::Result<(u16, u8, u8, u8, u8, u8)> {
    let len = reader.read_u8()? as usize;
    let (mut year, mut month, mut day) = (0u16, 0u8, 0u8);
    let (mut hour, mut minute, mut second) = (0u8, 0u8, 0u8);
    let mut consumed = 0;
    if len >= 4 {
        year = reader.read_u16::<LE>()?;
        month = reader.read_u8()?;
        day = reader.read_u8()?;
        consumed = 4;
    }
    if len >= 7 {
        hour = reader.read_u8()?;
        minute = reader.read_u8()?;
        second = reader.read_u8()?;
        consumed = 7;
    }
    // Fractional seconds are transmitted but not represented.
    if len > consumed {
        reader.read_fixed_bytes(len - consumed)?;
    }
    Ok((year, month, day, hour, minute, second))
}

fn read_bin_time(reader: &mut &[u8]) -> io::Result<(bool, u32, u8, u8, u8)> {
    let len = reader.read_u8()? as usize;
    let (mut neg, mut days) = (false, 0u32);
    let (mut hours, mut minutes, mut seconds) = (0u8, 0u8, 0u8);
    let mut consumed = 0;
    if len >= 8 {
        neg = reader.read_u8()? == 1;
        days = reader.read_u32::<LE>()?;
        hours = reader.read_u8()?;
        minutes = reader.read_u8()?;
        seconds = reader.read_u8()?;
        consumed = 8;
    }
    if len > consumed {
        reader.read_fixed_bytes(len - consumed)?;
    }
    Ok((neg, days, hours, minutes, seconds))
}

fn write_bin_date(writer: &mut Vec<u8>, y: u16, m: u8, d: u8) -> io::Result<()> {
    if (y, m, d) == (0, 0, 0) {
        writer.write_u8(0)
    } else {
        writer.write_u8(4)?;
        writer.write_u16::<LE>(y)?;
        writer.write_u8(m)?;
        writer.write_u8(d)
    }
}

fn write_bin_datetime(
    writer: &mut Vec<u8>,
    y: u16,
    mo: u8,
    d: u8,
    h: u8,
    mi: u8,
    s: u8,
) -> io::Result<()> {
    if (h, mi, s) == (0, 0, 0) {
        write_bin_date(writer, y, mo, d)
    } else {
        writer.write_u8(7)?;
        writer.write_u16::<LE>(y)?;
        writer.write_u8(mo)?;
        writer.write_u8(d)?;
        writer.write_u8(h)?;
        writer.write_u8(mi)?;
        writer.write_u8(s)
    }
}

fn write_bin_time(writer: &mut Vec<u8>, neg: bool, d: u32, h: u8, m: u8, s: u8) -> io::Result<()> {
    if !neg && (d, h, m, s) == (0, 0, 0, 0) {
        writer.write_u8(0)
    } else {
        writer.write_u8(8)?;
        writer.write_u8(if neg { 1 } else { 0 })?;
        writer.write_u32::<LE>(d)?;
        writer.write_u8(h)?;
        writer.write_u8(m)?;
        writer.write_u8(s)
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Value {
        Value::Bool(x)
    }
}

macro_rules! into_value_int {
    ($t:ty) => {
        impl From<$t> for Value {
            fn from(x: $t) -> Value {
                Value::Int(i64::from(x))
            }
        }
    };
}

macro_rules! into_value_uint {
    ($t:ty) => {
        impl From<$t> for Value {
            fn from(x: $t) -> Value {
                Value::UInt(u64::from(x))
            }
        }
    };
}

into_value_int!(i8);
into_value_int!(i16);
into_value_int!(i32);
into_value_int!(i64);
into_value_uint!(u8);
into_value_uint!(u16);
into_value_uint!(u32);
into_value_uint!(u64);

impl From<f32> for Value {
    fn from(x: f32) -> Value {
        Value::Float(x)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Double(x)
    }
}

impl From<String> for Value {
    fn from(x: String) -> Value {
        Value::Text(x)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(x: &'a str) -> Value {
        Value::Text(x.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(x: Vec<u8>) -> Value {
        Value::Bytes(x)
    }
}

impl<'a> From<&'a [u8]> for Value {
    fn from(x: &'a [u8]) -> Value {
        Value::Bytes(x.to_vec())
    }
}

impl From<NaiveDate> for Value {
    fn from(x: NaiveDate) -> Value {
        Value::Date(x.year() as u16, x.month() as u8, x.day() as u8)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(x: NaiveDateTime) -> Value {
        Value::DateTime(
            x.year() as u16,
            x.month() as u8,
            x.day() as u8,
            x.hour() as u8,
            x.minute() as u8,
            x.second() as u8,
        )
    }
}

impl From<NaiveTime> for Value {
    fn from(x: NaiveTime) -> Value {
        Value::Time(
            false,
            0,
            x.hour() as u8,
            x.minute() as u8,
            x.second() as u8,
        )
    }
}

impl From<Duration> for Value {
    fn from(x: Duration) -> Value {
        let secs = x.as_secs();
        Value::Time(
            false,
            (secs / 86_400) as u32,
            ((secs % 86_400) / 3_600) as u8,
            ((secs % 3_600) / 60) as u8,
            (secs % 60) as u8,
        )
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(x: Option<T>) -> Value {
        match x {
            Some(x) => x.into(),
            None => Value::NULL,
        }
    }
}

/// Extraction of a host value out of a `Value`.
///
/// `from_value_opt` hands the original value back on mismatch so callers can
/// retry with another type.
pub trait FromValue: Sized {
    fn from_value_opt(v: Value) -> Result<Self, Value>;
}

/// Will panic if the value does not convert to `T`.
#[inline]
pub fn from_value<T: FromValue>(v: Value) -> T {
    match T::from_value_opt(v) {
        Ok(x) => x,
        Err(v) => panic!("Could not retrieve a value from {:?}", v),
    }
}

#[inline]
pub fn from_value_opt<T: FromValue>(v: Value) -> Result<T, Value> {
    T::from_value_opt(v)
}

impl FromValue for Value {
    fn from_value_opt(v: Value) -> Result<Value, Value> {
        Ok(v)
    }
}

impl FromValue for bool {
    fn from_value_opt(v: Value) -> Result<bool, Value> {
        match v {
            Value::Bool(x) => Ok(x),
            Value::Int(0) | Value::UInt(0) => Ok(false),
            Value::Int(1) | Value::UInt(1) => Ok(true),
            v => Err(v),
        }
    }
}

impl FromValue for i64 {
    fn from_value_opt(v: Value) -> Result<i64, Value> {
        match v {
            Value::Int(x) => Ok(x),
            Value::UInt(x) if x <= i64::max_value() as u64 => Ok(x as i64),
            Value::Text(s) => match i64::from_str(&s) {
                Ok(x) => Ok(x),
                Err(_) => Err(Value::Text(s)),
            },
            v => Err(v),
        }
    }
}

impl FromValue for u64 {
    fn from_value_opt(v: Value) -> Result<u64, Value> {
        match v {
            Value::UInt(x) => Ok(x),
            Value::Int(x) if x >= 0 => Ok(x as u64),
            Value::Text(s) => match u64::from_str(&s) {
                Ok(x) => Ok(x),
                Err(_) => Err(Value::Text(s)),
            },
            v => Err(v),
        }
    }
}

macro_rules! from_value_via {
    ($t:ty, $via:ty) => {
        impl FromValue for $t {
            fn from_value_opt(v: Value) -> Result<$t, Value> {
                use std::convert::TryFrom;
                let wide = <$via as FromValue>::from_value_opt(v)?;
                <$t>::try_from(wide).map_err(|_| Value::from(wide))
            }
        }
    };
}

from_value_via!(i8, i64);
from_value_via!(i16, i64);
from_value_via!(i32, i64);
from_value_via!(u8, u64);
from_value_via!(u16, u64);
from_value_via!(u32, u64);

impl FromValue for f32 {
    fn from_value_opt(v: Value) -> Result<f32, Value> {
        match v {
            Value::Float(x) => Ok(x),
            v => Err(v),
        }
    }
}

impl FromValue for f64 {
    fn from_value_opt(v: Value) -> Result<f64, Value> {
        match v {
            Value::Double(x) => Ok(x),
            Value::Float(x) => Ok(f64::from(x)),
            Value::Int(x) => Ok(x as f64),
            v => Err(v),
        }
    }
}

impl FromValue for String {
    fn from_value_opt(v: Value) -> Result<String, Value> {
        match v {
            Value::Text(s) => Ok(s),
            Value::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(s) => Ok(s),
                Err(err) => Err(Value::Bytes(err.into_bytes())),
            },
            v => Err(v),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value_opt(v: Value) -> Result<Vec<u8>, Value> {
        match v {
            Value::Bytes(bytes) => Ok(bytes),
            Value::Text(s) => Ok(s.into_bytes()),
            v => Err(v),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value_opt(v: Value) -> Result<NaiveDate, Value> {
        match v {
            Value::Date(y, m, d) | Value::DateTime(y, m, d, ..) => {
                NaiveDate::from_ymd_opt(i32::from(y), u32::from(m), u32::from(d))
                    .ok_or(Value::Date(y, m, d))
            }
            v => Err(v),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value_opt(v: Value) -> Result<NaiveDateTime, Value> {
        match v {
            Value::Date(y, m, d) => {
                NaiveDate::from_ymd_opt(i32::from(y), u32::from(m), u32::from(d))
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .ok_or(Value::Date(y, m, d))
            }
            Value::DateTime(y, mo, d, h, mi, s) => {
                NaiveDate::from_ymd_opt(i32::from(y), u32::from(mo), u32::from(d))
                    .and_then(|date| date.and_hms_opt(u32::from(h), u32::from(mi), u32::from(s)))
                    .ok_or(Value::DateTime(y, mo, d, h, mi, s))
            }
            v => Err(v),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value_opt(v: Value) -> Result<NaiveTime, Value> {
        match v {
            Value::Time(false, 0, h, m, s) => {
                NaiveTime::from_hms_opt(u32::from(h), u32::from(m), u32::from(s))
                    .ok_or(Value::Time(false, 0, h, m, s))
            }
            v => Err(v),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value_opt(v: Value) -> Result<Option<T>, Value> {
        match v {
            Value::NULL => Ok(None),
            v => T::from_value_opt(v).map(Some),
        }
    }
}
