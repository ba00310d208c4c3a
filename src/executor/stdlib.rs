//! Builtin functions callable from fixture code

use super::errors::Exception;
use super::expressions::EvalResult;
use super::host::FileSystem;
use super::types::Val;

/// Largest list `array` will allocate
pub const MAX_ARRAY_SIZE: i32 = 1 << 20;

/// Builtin function identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `str(x)`: display form of any value
    Str,
    /// `len(x)`: length of a list or string
    Len,
    /// `array(n, fill)`: list of `n` copies of `fill`
    Array,
    /// `list()`: empty growable list
    List,
    /// `readFirstLine(path)`: first line of a file, without a scoped handle
    ReadFirstLine,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::Str,
        Builtin::Len,
        Builtin::Array,
        Builtin::List,
        Builtin::ReadFirstLine,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Str => "str",
            Builtin::Len => "len",
            Builtin::Array => "array",
            Builtin::List => "list",
            Builtin::ReadFirstLine => "readFirstLine",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn arity(&self) -> usize {
        match self {
            Builtin::List => 0,
            Builtin::Str | Builtin::Len | Builtin::ReadFirstLine => 1,
            Builtin::Array => 2,
        }
    }
}

/* ===================== Dispatcher ===================== */

/// Call a builtin with already-evaluated arguments
pub fn call_builtin(func: Builtin, args: &[Val], files: &mut dyn FileSystem) -> EvalResult {
    if args.len() != func.arity() {
        return Err(Exception::argument(format!(
            "{} expects {} argument(s), got {}",
            func.name(),
            func.arity(),
            args.len()
        )));
    }

    match func {
        Builtin::Str => Ok(Val::Str(args[0].to_string())),
        Builtin::Len => len(&args[0]),
        Builtin::Array => array(&args[0], &args[1]),
        Builtin::List => Ok(Val::List(Vec::new())),
        Builtin::ReadFirstLine => match &args[0] {
            Val::Str(path) => files.read_first_line(path).map(Val::Str),
            other => Err(Exception::type_error(format!(
                "readFirstLine expects a string path, got {}",
                other.type_name()
            ))),
        },
    }
}

/// Length of a list or string (in characters)
pub fn len(val: &Val) -> EvalResult {
    let n = match val {
        Val::List(items) => items.len(),
        Val::Str(s) => s.chars().count(),
        other => {
            return Err(Exception::type_error(format!(
                "{} has no length",
                other.type_name()
            )))
        }
    };
    Ok(Val::Int(n as i32))
}

fn array(size: &Val, fill: &Val) -> EvalResult {
    let n = size.as_int()?;
    if n < 0 {
        return Err(Exception::argument(format!("Negative array size: {}", n)));
    }
    if n > MAX_ARRAY_SIZE {
        return Err(Exception::argument(format!(
            "Array size {} exceeds limit of {}",
            n, MAX_ARRAY_SIZE
        )));
    }
    Ok(Val::List(vec![fill.clone(); n as usize]))
}
