// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use crate::consts::CapabilityFlags;
use crate::error::DsnError;

/// Mysql connection options.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Opts {
    /// Address of the mysql server (defaults to `127.0.0.1`).
    ip_or_hostname: String,
    /// TCP port of the mysql server (defaults to `3306`).
    tcp_port: u16,
    /// User (defaults to `None`).
    user: Option<String>,
    /// Password (defaults to `None`).
    pass: Option<String>,
    /// Database name (defaults to `None`).
    db_name: Option<String>,
    /// Capability bits requested on top of the driver's baseline.
    additional_capabilities: CapabilityFlags,
}

impl Opts {
    /// Parses a `key=value;` connection string.
    ///
    /// Recognized keys: `host`, `user`, `pwd`, `db`, `port`. Unknown keys
    /// fail. Values cannot contain `;`; there is no escape syntax.
    pub fn from_dsn(dsn: &str) -> Result<Opts, DsnError> {
        let mut opts = Opts::default();
        for pair in dsn.split(';') {
            if pair.is_empty() {
                continue;
            }
            let mut it = pair.splitn(2, '=');
            let key = it.next().unwrap_or("");
            let value = match it.next() {
                Some(value) => value,
                None => return Err(DsnError::BadPair(pair.to_owned())),
            };
            match key {
                "host" => opts.ip_or_hostname = value.to_owned(),
                "user" => opts.user = Some(value.to_owned()),
                "pwd" => opts.pass = Some(value.to_owned()),
                "db" => opts.db_name = Some(value.to_owned()),
                "port" => {
                    opts.tcp_port = value
                        .parse()
                        .map_err(|_| DsnError::InvalidValue(key.to_owned(), value.to_owned()))?
                }
                _ => return Err(DsnError::UnknownParameter(key.to_owned())),
            }
        }
        Ok(opts)
    }

    pub fn get_ip_or_hostname(&self) -> &str {
        &self.ip_or_hostname
    }

    pub fn get_tcp_port(&self) -> u16 {
        self.tcp_port
    }

    pub fn get_user(&self) -> String {
        self.user.clone().unwrap_or_default()
    }

    pub fn get_pass(&self) -> String {
        self.pass.clone().unwrap_or_default()
    }

    pub fn get_db_name(&self) -> String {
        self.db_name.clone().unwrap_or_default()
    }

    pub fn get_additional_capabilities(&self) -> CapabilityFlags {
        self.additional_capabilities
    }

    pub(crate) fn addr_display(&self) -> String {
        format!("{}:{}", self.ip_or_hostname, self.tcp_port)
    }
}

impl Default for Opts {
    fn default() -> Opts {
        Opts {
            ip_or_hostname: "127.0.0.1".to_owned(),
            tcp_port: 3306,
            user: None,
            pass: None,
            db_name: None,
            additional_capabilities: CapabilityFlags::empty(),
        }
    }
}

/// Builder for [`Opts`](struct.Opts.html).
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct OptsBuilder {
    opts: Opts,
}

impl OptsBuilder {
    pub fn new() -> Self {
        OptsBuilder::default()
    }

    pub fn from_opts(opts: Opts) -> Self {
        OptsBuilder { opts }
    }

    /// Address of the mysql server (defaults to `127.0.0.1`).
    pub fn ip_or_hostname<T: Into<String>>(&mut self, ip_or_hostname: Option<T>) -> &mut Self {
        self.opts.ip_or_hostname = ip_or_hostname
            .map(Into::into)
            .unwrap_or_else(|| "127.0.0.1".to_owned());
        self
    }

    /// TCP port of the mysql server (defaults to `3306`).
    pub fn tcp_port(&mut self, tcp_port: u16) -> &mut Self {
        self.opts.tcp_port = tcp_port;
        self
    }

    /// User (defaults to `None`).
    pub fn user<T: Into<String>>(&mut self, user: Option<T>) -> &mut Self {
        self.opts.user = user.map(Into::into);
        self
    }

    /// Password (defaults to `None`).
    pub fn pass<T: Into<String>>(&mut self, pass: Option<T>) -> &mut Self {
        self.opts.pass = pass.map(Into::into);
        self
    }

    /// Database name (defaults to `None`).
    pub fn db_name<T: Into<String>>(&mut self, db_name: Option<T>) -> &mut Self {
        self.opts.db_name = db_name.map(Into::into);
        self
    }

    /// Capability bits requested on top of the driver's baseline.
    ///
    /// The baseline itself (PROTOCOL_41, SECURE_CONNECTION) cannot be
    /// removed.
    pub fn additional_capabilities(&mut self, flags: CapabilityFlags) -> &mut Self {
        self.opts.additional_capabilities = flags;
        self
    }
}

impl From<OptsBuilder> for Opts {
    fn from(builder: OptsBuilder) -> Opts {
        builder.opts
    }
}

impl<'a> From<&'a mut OptsBuilder> for Opts {
    fn from(builder: &'a mut OptsBuilder) -> Opts {
        builder.opts.clone()
    }
}
