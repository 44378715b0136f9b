//! vlmrun-runtime - guest-visible global surface for the vlmrun benchmark runtime.
//!
//! This crate is the bootstrap layer of an embedded script execution context.
//! From a small set of host-provided primitives (a print function, a table of
//! asynchronous operations, a monotonic timing facility, and ambient
//! benchmarking constructors) it assembles the only API surface guest code
//! may see: a restricted `console`, the `vlmrunjs` utility namespace, and
//! top-level benchmarking identifiers copied from the ambient environment.

mod bootstrap;
mod console;
mod ops;
mod timing;
mod value;

pub use bootstrap::{init_global_surface, AmbientEnv, GlobalSurface, VlmRunJs, BENCH_GLOBALS};
pub use console::{
    args_to_message, CaptureSink, ChannelSink, Console, LogEntry, LogStorage, LoggerSink,
    PrintSink,
};
pub use ops::{fs_ops, names as op_names, HostOp, OpFuture, OpResult, OpTable};
pub use timing::Performance;
pub use value::{FunctionRef, SerializationError, Value};
