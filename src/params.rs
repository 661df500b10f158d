// Copyright (c) 2026 mylite contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::consts::ColumnType;
use crate::value::Value;

/// One prepared-statement argument: the value plus the wire type it will be
/// declared as in the execute packet.
///
/// Conversions from host types capture the exact width (an `i16` is declared
/// SHORT, not LONGLONG), which is what the server sees in the type table.
#[derive(Clone, PartialEq, Debug)]
pub struct Param {
    pub(crate) value: Value,
    pub(crate) coltype: ColumnType,
    pub(crate) unsigned: bool,
}

impl Param {
    /// Wraps a `Value` with the wire type implied by its variant.
    pub fn new(value: Value) -> Param {
        let (coltype, unsigned) = match value {
            Value::NULL => (ColumnType::MYSQL_TYPE_NULL, false),
            Value::Bool(_) => (ColumnType::MYSQL_TYPE_BIT, false),
            Value::Int(_) => (ColumnType::MYSQL_TYPE_LONGLONG, false),
            Value::UInt(_) => (ColumnType::MYSQL_TYPE_LONGLONG, true),
            Value::Float(_) => (ColumnType::MYSQL_TYPE_FLOAT, false),
            Value::Double(_) => (ColumnType::MYSQL_TYPE_DOUBLE, false),
            Value::Bytes(_) => (ColumnType::MYSQL_TYPE_TINY_BLOB, false),
            Value::Text(_) => (ColumnType::MYSQL_TYPE_VARCHAR, false),
            Value::Date(..) => (ColumnType::MYSQL_TYPE_DATE, false),
            Value::Time(..) => (ColumnType::MYSQL_TYPE_TIME, false),
            Value::DateTime(..) => (ColumnType::MYSQL_TYPE_DATETIME, false),
        };
        Param {
            value,
            coltype,
            unsigned,
        }
    }

    /// Wraps a `Value` with an explicit wire type.
    pub fn typed(value: Value, coltype: ColumnType, unsigned: bool) -> Param {
        Param {
            value,
            coltype,
            unsigned,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

macro_rules! into_param {
    ($t:ty, $coltype:expr, $unsigned:expr) => {
        impl From<$t> for Param {
            fn from(x: $t) -> Param {
                Param::typed(Value::from(x), $coltype, $unsigned)
            }
        }
    };
}

into_param!(bool, ColumnType::MYSQL_TYPE_BIT, false);
into_param!(i8, ColumnType::MYSQL_TYPE_TINY, false);
into_param!(u8, ColumnType::MYSQL_TYPE_TINY, true);
into_param!(i16, ColumnType::MYSQL_TYPE_SHORT, false);
into_param!(u16, ColumnType::MYSQL_TYPE_SHORT, true);
into_param!(i32, ColumnType::MYSQL_TYPE_LONG, false);
into_param!(u32, ColumnType::MYSQL_TYPE_LONG, true);
into_param!(i64, ColumnType::MYSQL_TYPE_LONGLONG, false);
into_param!(u64, ColumnType::MYSQL_TYPE_LONGLONG, true);
into_param!(f32, ColumnType::MYSQL_TYPE_FLOAT, false);
into_param!(f64, ColumnType::MYSQL_TYPE_DOUBLE, false);
into_param!(String, ColumnType::MYSQL_TYPE_VARCHAR, false);
into_param!(NaiveDate, ColumnType::MYSQL_TYPE_DATE, false);
into_param!(NaiveTime, ColumnType::MYSQL_TYPE_TIME, false);
into_param!(NaiveDateTime, ColumnType::MYSQL_TYPE_DATETIME, false);
into_param!(Duration, ColumnType::MYSQL_TYPE_TIME, false);
into_param!(Vec<u8>, ColumnType::MYSQL_TYPE_TINY_BLOB, false);

impl<'a> From<&'a str> for Param {
    fn from(x: &'a str) -> Param {
        Param::typed(Value::from(x), ColumnType::MYSQL_TYPE_VARCHAR, false)
    }
}

impl<'a> From<&'a [u8]> for Param {
    fn from(x: &'a [u8]) -> Param {
        Param::typed(Value::from(x), ColumnType::MYSQL_TYPE_TINY_BLOB, false)
    }
}

impl From<Value> for Param {
    fn from(x: Value) -> Param {
        Param::new(x)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(x: Option<T>) -> Param {
        match x {
            Some(x) => x.into(),
            None => Param::new(Value::NULL),
        }
    }
}

/// Positional arguments of a statement execution.
#[derive(Clone, PartialEq, Debug)]
pub enum Params {
    Empty,
    Positional(Vec<Param>),
}

impl Params {
    pub fn len(&self) -> usize {
        match *self {
            Params::Empty => 0,
            Params::Positional(ref params) => params.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn into_positional(self) -> Vec<Param> {
        match self {
            Params::Empty => Vec::new(),
            Params::Positional(params) => params,
        }
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Params {
        Params::Empty
    }
}

impl From<Vec<Param>> for Params {
    fn from(params: Vec<Param>) -> Params {
        Params::Positional(params)
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Params {
        Params::Positional(values.into_iter().map(Param::new).collect())
    }
}

macro_rules! into_params_tuple {
    ($($name:ident,)+) => {
        impl<$($name: Into<Param>,)+> From<($($name,)+)> for Params {
            #[allow(non_snake_case)]
            fn from(($($name,)+): ($($name,)+)) -> Params {
                Params::Positional(vec![$($name.into(),)+])
            }
        }
    };
}

into_params_tuple!(T1,);
into_params_tuple!(T1, T2,);
into_params_tuple!(T1, T2, T3,);
into_params_tuple!(T1, T2, T3, T4,);
into_params_tuple!(T1, T2, T3, T4, T5,);
into_params_tuple!(T1, T2, T3, T4, T5, T6,);
into_params_tuple!(T1, T2, T3, T4, T5, T6, T7,);
into_params_tuple!(T1, T2, T3, T4, T5, T6, T7, T8,);
into_params_tuple!(T1, T2, T3, T4, T5, T6, T7, T8, T9,);
into_params_tuple!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10,);
into_params_tuple!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11,);
into_params_tuple!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12,);
