//! Data type AST nodes.
//!
//! The parser does not interpret type names; it records the written name
//! and its argument list and leaves normalization to the engine's type
//! model, which accepts arbitrarily nested forms such as
//! `Map(String, Array(Nullable(Int64)))`.

use core::fmt;

/// One argument of a parameterized type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeArg {
    /// A nested type, e.g. the `Int64` in `Array(Int64)`.
    Type(DataType),
    /// A named nested type, e.g. `Tuple(id Int64, name String)`.
    Named {
        /// Element name.
        name: String,
        /// Element type.
        data_type: DataType,
    },
    /// An integer parameter, e.g. the `16` in `FixedString(16)`.
    Integer(i64),
    /// A string parameter, e.g. the timezone in `DateTime('UTC')`.
    String(String),
}

/// A parsed data type: a name plus optional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct DataType {
    /// The type name as written.
    pub name: String,
    /// Arguments, empty for simple types.
    pub args: Vec<TypeArg>,
}

impl DataType {
    /// Creates a simple (argument-free) type.
    #[must_use]
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Creates a type with arguments.
    #[must_use]
    pub fn with_args(name: impl Into<String>, args: Vec<TypeArg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match arg {
                TypeArg::Type(t) => write!(f, "{t}")?,
                TypeArg::Named { name, data_type } => write!(f, "{name} {data_type}")?,
                TypeArg::Integer(n) => write!(f, "{n}")?,
                TypeArg::String(s) => write!(f, "'{s}'")?,
            }
        }
        f.write_str(")")
    }
}
