// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::io;
use std::io::Read as StdRead;
use std::io::Write as StdWrite;

use byteorder::LittleEndian as LE;
use byteorder::{ReadBytesExt, WriteBytesExt};

/// Byte-stream transport a connection runs over. TCP is the stock
/// implementation; anything readable and writable fits behind this seam.
pub trait Transport: io::Read + io::Write + Send {}

impl<T: io::Read + io::Write + Send> Transport for T {}

pub trait Read: ReadBytesExt {
    /// Reads a length-encoded integer.
    ///
    /// The NULL marker (0xfb) and the reserved byte (0xff) are not valid
    /// here; callers that may see NULL check the head byte first.
    fn read_lenenc_int(&mut self) -> io::Result<u64> {
        let head_byte = self.read_u8()?;
        let length = match head_byte {
            0xfb | 0xff => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Invalid length-encoded integer head byte",
                ));
            }
            0xfc => 2,
            0xfd => 3,
            0xfe => 8,
            x => return Ok(u64::from(x)),
        };
        self.read_uint::<LE>(length)
    }

    fn read_lenenc_bytes(&mut self) -> io::Result<Vec<u8>> {
        let len = self.read_lenenc_int()?;
        let mut out = Vec::with_capacity(len as usize);
        let count = if len > 0 {
            self.take(len).read_to_end(&mut out)?
        } else {
            0
        };
        if count as u64 == len {
            Ok(out)
        } else {
            Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Unexpected EOF while reading length encoded string",
            ))
        }
    }

    /// Reads bytes up to (and consuming) the first 0x00.
    fn read_to_null(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let c = self.read_u8()?;
            if c == 0u8 {
                break;
            }
            out.push(c);
        }
        Ok(out)
    }

    fn read_fixed_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.read_exact(&mut out)?;
        Ok(out)
    }
}

impl<T: ReadBytesExt> Read for T {}

pub trait Write: WriteBytesExt {
    fn write_le_uint_n(&mut self, x: u64, len: usize) -> io::Result<()> {
        self.write_uint::<LE>(x, len)
    }

    fn write_lenenc_int(&mut self, x: u64) -> io::Result<()> {
        if x < 251 {
            self.write_u8(x as u8)
        } else if x < 65_536 {
            self.write_u8(0xfc)?;
            self.write_uint::<LE>(x, 2)
        } else if x < 16_777_216 {
            self.write_u8(0xfd)?;
            self.write_uint::<LE>(x, 3)
        } else {
            self.write_u8(0xfe)?;
            self.write_uint::<LE>(x, 8)
        }
    }

    fn write_lenenc_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_lenenc_int(bytes.len() as u64)?;
        self.write_all(bytes)
    }

    fn write_null_str(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.write_u8(0u8)
    }
}

impl<T: WriteBytesExt> Write for T {}
