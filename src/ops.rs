//! Host operation table bridged into the guest namespace.
//!
//! Operations are the boundary between guest-visible adapters and host-native
//! behavior. The table is keyed by name so wrappers hold only a call-by-name
//! indirection, never an owning reference to a host implementation, and the
//! host stays free to swap implementations behind the same layout.
//!
//! Errors produced by an operation are opaque to this crate: they travel to
//! the guest caller unchanged, with no translation or recovery.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};
use tokio::fs;

use crate::value::Value;

/// Eventual outcome of a host operation. The error side is host-defined.
pub type OpResult = Result<Value>;

/// A pending host operation. Not `Send`: execution is single-threaded
/// cooperative, and callers suspend at the await point.
pub type OpFuture = Pin<Box<dyn Future<Output = OpResult>>>;

/// A named asynchronous host primitive.
pub type HostOp = Rc<dyn Fn(Vec<Value>) -> OpFuture>;

/// The host table layout the namespace adapters dispatch against.
pub mod names {
    pub const READ_FILE: &str = "op_read_file";
    pub const WRITE_FILE: &str = "op_write_file";
    pub const REMOVE_FILE: &str = "op_remove_file";
    pub const READ_DIR: &str = "op_read_dir";
    pub const MAKE_DIR: &str = "op_make_dir";
    pub const REMOVE_DIR: &str = "op_remove_dir";
    pub const READ_LINK: &str = "op_read_link";
}

/// Registry of named asynchronous host operations.
#[derive(Default)]
pub struct OpTable {
    ops: BTreeMap<String, HostOp>,
}

impl OpTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn with_op<F>(mut self, name: &str, op: F) -> Self
    where
        F: Fn(Vec<Value>) -> OpFuture + 'static,
    {
        self.register(name, op);
        self
    }

    /// Register an operation under the given name, replacing any previous one.
    pub fn register<F>(&mut self, name: &str, op: F)
    where
        F: Fn(Vec<Value>) -> OpFuture + 'static,
    {
        self.ops.insert(name.to_string(), Rc::new(op));
    }

    /// Whether an operation is registered under the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// The registered operation names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.ops.keys().map(String::as_str).collect()
    }

    /// Dispatch a call by name, forwarding the arguments untouched.
    ///
    /// An unregistered name resolves to an error future rather than a panic;
    /// whether that can happen is the host's contract, not the caller's.
    pub fn call(&self, name: &str, args: Vec<Value>) -> OpFuture {
        match self.ops.get(name) {
            Some(op) => op(args),
            None => {
                let missing = anyhow!("unknown op: {name}");
                Box::pin(async move { Err(missing) })
            }
        }
    }
}

/// Stock operation table backing all seven filesystem operations with local
/// file I/O. I/O failures surface as the underlying errors, untranslated.
pub fn fs_ops() -> OpTable {
    OpTable::new()
        .with_op(names::READ_FILE, |args| {
            Box::pin(async move {
                let path = path_arg(&args)?;
                let contents = fs::read_to_string(&path).await?;
                Ok(Value::text(contents))
            })
        })
        .with_op(names::WRITE_FILE, |args| {
            Box::pin(async move {
                let path = path_arg(&args)?;
                let data = data_arg(&args)?;
                fs::write(&path, data).await?;
                Ok(Value::Undefined)
            })
        })
        .with_op(names::REMOVE_FILE, |args| {
            Box::pin(async move {
                let path = path_arg(&args)?;
                fs::remove_file(&path).await?;
                Ok(Value::Undefined)
            })
        })
        .with_op(names::READ_DIR, |args| {
            Box::pin(async move {
                let path = path_arg(&args)?;
                let mut reader = fs::read_dir(&path).await?;
                let mut entries = Vec::new();
                while let Some(entry) = reader.next_entry().await? {
                    let kind = entry.file_type().await?;
                    let mut fields = BTreeMap::new();
                    fields.insert(
                        "name".to_string(),
                        Value::text(entry.file_name().to_string_lossy()),
                    );
                    fields.insert("isFile".to_string(), Value::Bool(kind.is_file()));
                    fields.insert("isDirectory".to_string(), Value::Bool(kind.is_dir()));
                    fields.insert("isSymlink".to_string(), Value::Bool(kind.is_symlink()));
                    entries.push(Value::object(fields));
                }
                Ok(Value::array(entries))
            })
        })
        .with_op(names::MAKE_DIR, |args| {
            Box::pin(async move {
                let path = path_arg(&args)?;
                fs::create_dir(&path).await?;
                Ok(Value::Undefined)
            })
        })
        .with_op(names::REMOVE_DIR, |args| {
            Box::pin(async move {
                let path = path_arg(&args)?;
                fs::remove_dir(&path).await?;
                Ok(Value::Undefined)
            })
        })
        .with_op(names::READ_LINK, |args| {
            Box::pin(async move {
                let path = path_arg(&args)?;
                let target = fs::read_link(&path).await?;
                Ok(Value::text(target.to_string_lossy()))
            })
        })
}

/// First positional argument, required to be a path string.
fn path_arg(args: &[Value]) -> Result<String> {
    match args.first() {
        Some(Value::Text(path)) => Ok(path.clone()),
        Some(_) => bail!("path must be a string"),
        None => bail!("missing path argument"),
    }
}

/// Second positional argument, required to be a text payload.
fn data_arg(args: &[Value]) -> Result<String> {
    match args.get(1) {
        Some(Value::Text(data)) => Ok(data.clone()),
        Some(_) => bail!("data must be a string"),
        None => bail!("missing data argument"),
    }
}
