//! Dynamic values used for duck-typed interop.
//!
//! The bind detector and the generic helpers work on values whose shape is
//! only known at runtime: records carrying method-like fields, lists, and
//! functions that may be user authored, native, or one of a handful of
//! built-ins. [`Value`] is that runtime representation. Clones are cheap:
//! compound data sits behind `Rc`.

use anyhow::{Result, anyhow, bail};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

type Body = dyn Fn(&Value, &[Value]) -> Result<Value>;

/// Runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<Vec<Value>>),
    Record(Rc<Record>),
    Function(Function),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Rc::new(items.into_iter().collect()))
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Record(_) => "record",
            Value::Function(_) => "function",
        }
    }

    /// Lists, records and functions. Strings carry methods but are not objects.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::List(_) | Value::Record(_) | Value::Function(_))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Unit => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(x) => *x != 0.0 && !x.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(_) | Value::Record(_) | Value::Function(_) => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(&**record),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Looks up a property: a record field, or a built-in method.
    pub fn property(&self, name: &str) -> Option<Value> {
        let builtin = match (self, name) {
            (Value::Record(record), _) => return record.get(name).cloned(),
            (Value::List(_), "flatMap") => Builtin::ListFlatMap,
            (Value::List(_), "concat") => Builtin::ListConcat,
            (Value::Str(_), "concat") => Builtin::StrConcat,
            (Value::Function(_), "bind") => Builtin::FunctionBind,
            _ => return None,
        };
        Some(Value::Function(builtin.function()))
    }

    /// Looks up a property and keeps it only if it is callable.
    pub fn method(&self, name: &str) -> Option<Function> {
        match self.property(name)? {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Invokes a method with `self` as receiver.
    pub fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        let method = self
            .method(name)
            .ok_or_else(|| anyhow!("{} value has no `{}` method", self.kind(), name))?;
        method.call_with(self, args)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Record(record) => {
                f.write_str("{")?;
                for (i, (name, value)) in record.fields().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                f.write_str("}")
            }
            Value::Function(function) => write!(f, "[function {}]", function.name()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(Rc::new(record))
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

/// Named fields. Fields holding functions double as methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Where a function came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Authored in user code.
    Script,
    /// Provided by the host, opaque to inspection.
    Native,
    /// One of the built-in methods of lists, strings and functions.
    Builtin(Builtin),
}

/// Built-in methods, identified by what they are rather than by address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    FunctionBind,
    ListFlatMap,
    ListConcat,
    StrConcat,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::FunctionBind => "bind",
            Builtin::ListFlatMap => "flatMap",
            Builtin::ListConcat | Builtin::StrConcat => "concat",
        }
    }

    pub fn function(self) -> Function {
        Function::from_parts(
            self.name().to_string(),
            1,
            Origin::Builtin(self),
            Box::new(move |this: &Value, args: &[Value]| self.invoke(this, args)),
        )
    }

    fn invoke(self, this: &Value, args: &[Value]) -> Result<Value> {
        match (self, this) {
            (Builtin::FunctionBind, Value::Function(target)) => {
                let (receiver, bound) = match args.split_first() {
                    Some((receiver, bound)) => (receiver.clone(), bound.to_vec()),
                    None => (Value::Unit, Vec::new()),
                };
                Ok(Value::Function(target.bind_to(receiver, bound)))
            }
            (Builtin::ListFlatMap, Value::List(items)) => {
                let f = args
                    .first()
                    .and_then(Value::as_function)
                    .ok_or_else(|| anyhow!("flatMap expects a function argument"))?;
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    match f.call(std::slice::from_ref(item))? {
                        Value::List(inner) => out.extend(inner.iter().cloned()),
                        other => out.push(other),
                    }
                }
                Ok(Value::list(out))
            }
            (Builtin::ListConcat, Value::List(items)) => {
                let mut out = items.to_vec();
                for arg in args {
                    match arg {
                        Value::List(inner) => out.extend(inner.iter().cloned()),
                        other => out.push(other.clone()),
                    }
                }
                Ok(Value::list(out))
            }
            (Builtin::StrConcat, Value::Str(s)) => {
                let mut out = s.to_string();
                for arg in args {
                    out.push_str(&arg.to_string());
                }
                Ok(Value::str(&out))
            }
            (builtin, this) => bail!(
                "built-in `{}` called on a {} receiver",
                builtin.name(),
                this.kind()
            ),
        }
    }
}

/// A callable value.
#[derive(Clone)]
pub struct Function(Rc<FunctionImpl>);

struct FunctionImpl {
    name: String,
    /// Declared number of parameters.
    arity: usize,
    origin: Origin,
    body: Box<Body>,
}

impl Function {
    /// User function ignoring its receiver.
    pub fn new<F>(name: &str, arity: usize, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Self::from_parts(
            name.to_string(),
            arity,
            Origin::Script,
            Box::new(move |_: &Value, args: &[Value]| body(args)),
        )
    }

    /// User function that sees its receiver.
    pub fn method<F>(name: &str, arity: usize, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        Self::from_parts(name.to_string(), arity, Origin::Script, Box::new(body))
    }

    /// Host-provided function.
    pub fn native<F>(name: &str, arity: usize, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        Self::from_parts(name.to_string(), arity, Origin::Native, Box::new(body))
    }

    fn from_parts(name: String, arity: usize, origin: Origin, body: Box<Body>) -> Self {
        Self(Rc::new(FunctionImpl {
            name,
            arity,
            origin,
            body,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn arity(&self) -> usize {
        self.0.arity
    }

    pub fn origin(&self) -> Origin {
        self.0.origin
    }

    /// Whether the function body is opaque host code.
    pub fn is_native(&self) -> bool {
        !matches!(self.0.origin, Origin::Script)
    }

    pub fn builtin(&self) -> Option<Builtin> {
        match self.0.origin {
            Origin::Builtin(builtin) => Some(builtin),
            _ => None,
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.0.body)(&Value::Unit, args)
    }

    pub fn call_with(&self, this: &Value, args: &[Value]) -> Result<Value> {
        (self.0.body)(this, args)
    }

    /// Fixes the receiver and leading arguments.
    ///
    /// The result is native and named `bound <name>`, which is how explicitly
    /// bound functions are told apart from other native code.
    pub fn bind_to(&self, this: Value, args: Vec<Value>) -> Function {
        let target = self.clone();
        let arity = self.arity().saturating_sub(args.len());
        Function::from_parts(
            format!("bound {}", self.name()),
            arity,
            Origin::Native,
            Box::new(move |_: &Value, more: &[Value]| {
                let all: Vec<Value> = args.iter().chain(more).cloned().collect();
                target.call_with(&this, &all)
            }),
        )
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.0.name)
            .field("arity", &self.0.arity)
            .field("origin", &self.0.origin)
            .finish()
    }
}
