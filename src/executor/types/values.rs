//! Runtime value types

use super::super::errors::{Exception, ExceptionKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of an acquired scoped resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// Runtime value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Val {
    Null,
    Bool(bool),
    /// 32-bit integer with wrapping arithmetic
    Int(i32),
    Str(String),
    List(Vec<Val>),
    Resource(ResourceId),
    Exception(Exception),
}

impl Val {
    /// Type name used in TypeFailure messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "bool",
            Val::Int(_) => "int",
            Val::Str(_) => "string",
            Val::List(_) => "list",
            Val::Resource(_) => "resource",
            Val::Exception(_) => "exception",
        }
    }

    /// Conditions must be booleans; anything else is a TypeFailure
    pub fn as_condition(&self) -> Result<bool, Exception> {
        match self {
            Val::Bool(b) => Ok(*b),
            other => Err(Exception::new(
                ExceptionKind::TypeFailure,
                format!("Condition must be a bool, got {}", other.type_name()),
            )),
        }
    }

    pub fn as_int(&self) -> Result<i32, Exception> {
        match self {
            Val::Int(n) => Ok(*n),
            other => Err(Exception::type_error(format!(
                "Expected int, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn str(s: impl Into<String>) -> Self {
        Val::Str(s.into())
    }
}

impl fmt::Display for Val {
    /// String form used by concatenation, `str()` and output emission
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Null => f.write_str("null"),
            Val::Bool(b) => write!(f, "{}", b),
            Val::Int(n) => write!(f, "{}", n),
            Val::Str(s) => f.write_str(s),
            Val::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Val::Resource(id) => write!(f, "resource#{}", id.0),
            Val::Exception(e) => write!(f, "{}", e),
        }
    }
}

impl From<i32> for Val {
    fn from(n: i32) -> Self {
        Val::Int(n)
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::Str(s.to_string())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::Str(s)
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_list_matches_collection_format() {
        let list = Val::List(vec![Val::Int(1), Val::str("a"), Val::Null]);
        assert_eq!(list.to_string(), "[1, a, null]");
    }

    #[test]
    fn test_condition_requires_bool() {
        assert_eq!(Val::Bool(true).as_condition(), Ok(true));
        let err = Val::Int(1).as_condition().unwrap_err();
        assert_eq!(err.kind, ExceptionKind::TypeFailure);
        assert!(err.message.contains("got int"));
    }
}
