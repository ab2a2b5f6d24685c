//! Read-only state inspection.
//!
//! Components answer dotted-path queries such as `cpu.pc` or `ula.border`.
//! Queries never affect emulation state.

use std::fmt;

/// A dynamically-typed value returned from a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    /// Raw bytes, e.g. a memory window.
    Bytes(Vec<u8>),
}

impl Value {
    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::Bool(v) => Some(u32::from(v)),
            Value::U8(v) => Some(u32::from(v)),
            Value::U16(v) => Some(u32::from(v)),
            Value::U32(v) => Some(v),
            Value::Bytes(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::Bytes(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{b:02X}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

/// A component whose state can be inspected by path.
pub trait Observable {
    /// Query a property such as `pc`, `a` or `flags.z`.
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// Every path `query()` answers for.
    fn query_paths(&self) -> &'static [&'static str];

    /// Answer every known path at once, in `query_paths()` order.
    fn dump(&self) -> Vec<(&'static str, Value)> {
        self.query_paths()
            .iter()
            .filter_map(|&path| self.query(path).map(|v| (path, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl Observable for Probe {
        fn query(&self, path: &str) -> Option<Value> {
            match path {
                "a" => Some(0x3Cu8.into()),
                "pc" => Some(0x8000u16.into()),
                _ => None,
            }
        }

        fn query_paths(&self) -> &'static [&'static str] {
            &["a", "pc", "missing"]
        }
    }

    #[test]
    fn dump_skips_unanswered_paths() {
        let dump = Probe.dump();
        assert_eq!(dump, vec![("a", Value::U8(0x3C)), ("pc", Value::U16(0x8000))]);
    }

    #[test]
    fn display_formats_by_width() {
        assert_eq!(Value::U8(0x0F).to_string(), "0x0F");
        assert_eq!(Value::U16(0x10AC).to_string(), "0x10AC");
        assert_eq!(Value::Bytes(vec![0xED, 0x00]).to_string(), "ED 00");
    }

    #[test]
    fn as_u32_widens() {
        assert_eq!(Value::Bool(true).as_u32(), Some(1));
        assert_eq!(Value::U16(0xFFFF).as_u32(), Some(0xFFFF));
        assert_eq!(Value::Bytes(vec![]).as_u32(), None);
    }
}
