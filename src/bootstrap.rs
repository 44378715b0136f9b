//! Assembly of the guest-visible global namespace.
//!
//! This is the bootstrap step that runs exactly once per script context,
//! before any guest code executes. It reads host-provided capabilities from
//! an [`AmbientEnv`], installs the restricted console and the `vlmrunjs`
//! utility namespace, and promotes the benchmarking identifiers to top-level
//! globals. After it returns, the surface is never mutated again by this
//! crate.
//!
//! # Capability boundary
//!
//! The namespace bridges exactly seven path-taking operations. Exposing a
//! further host capability requires adding an adapter here, so the full
//! guest-reachable surface stays auditable in one place.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::console::{Console, PrintSink};
use crate::ops::{names, OpFuture, OpTable};
use crate::timing::Performance;
use crate::value::Value;

/// Benchmarking identifiers promoted from the ambient bindings to top-level
/// globals. Copied verbatim; absent names install as `Undefined`.
pub const BENCH_GLOBALS: [&str; 7] = [
    "test",
    "bench",
    "Benchmark",
    "BenchmarkResult",
    "BenchmarkSuite",
    "BenchmarkSuiteResult",
    "runBenchmarks",
];

/// Host-provided capabilities the initializer reads.
///
/// Passing these explicitly (rather than pulling them out of an ambient
/// global object) keeps every dependency visible at the call site and lets
/// tests substitute fakes for any of them.
pub struct AmbientEnv {
    print: Rc<dyn PrintSink>,
    ops: Rc<OpTable>,
    performance: Rc<Performance>,
    bindings: BTreeMap<String, Value>,
}

impl AmbientEnv {
    /// Bundle the three host primitives. Named bindings start empty.
    pub fn new(print: Rc<dyn PrintSink>, ops: Rc<OpTable>, performance: Rc<Performance>) -> Self {
        Self {
            print,
            ops,
            performance,
            bindings: BTreeMap::new(),
        }
    }

    /// Add a named ambient binding (benchmarking constructors and the like).
    pub fn with_binding(mut self, name: &str, value: Value) -> Self {
        self.bindings.insert(name.to_string(), value);
        self
    }

    /// Look up a named ambient binding.
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }
}

/// The `vlmrunjs` utility namespace: the timing facility passed through
/// unchanged, plus seven thin adapters over the host operation table.
///
/// Adapters are pure name-stable indirection. They perform no validation, no
/// path normalization, and no error translation; constraint checking and
/// error semantics belong to the host operation behind each name.
pub struct VlmRunJs {
    performance: Rc<Performance>,
    ops: Rc<OpTable>,
}

impl VlmRunJs {
    fn new(performance: Rc<Performance>, ops: Rc<OpTable>) -> Self {
        Self { performance, ops }
    }

    /// Monotonic timestamp in milliseconds, drawn from the host clock.
    pub fn now(&self) -> f64 {
        self.performance.now()
    }

    /// The host timing facility itself, unchanged.
    pub fn performance(&self) -> Rc<Performance> {
        Rc::clone(&self.performance)
    }

    /// Read a file's contents.
    pub fn read_file(&self, path: &str) -> OpFuture {
        self.ops.call(names::READ_FILE, vec![Value::text(path)])
    }

    /// Write a data payload to a file.
    pub fn write_file(&self, path: &str, data: Value) -> OpFuture {
        self.ops.call(names::WRITE_FILE, vec![Value::text(path), data])
    }

    /// Remove a file.
    pub fn remove_file(&self, path: &str) -> OpFuture {
        self.ops.call(names::REMOVE_FILE, vec![Value::text(path)])
    }

    /// List a directory's entries.
    pub fn read_dir(&self, path: &str) -> OpFuture {
        self.ops.call(names::READ_DIR, vec![Value::text(path)])
    }

    /// Create a directory.
    pub fn make_dir(&self, path: &str) -> OpFuture {
        self.ops.call(names::MAKE_DIR, vec![Value::text(path)])
    }

    /// Remove a directory.
    pub fn remove_dir(&self, path: &str) -> OpFuture {
        self.ops.call(names::REMOVE_DIR, vec![Value::text(path)])
    }

    /// Resolve a symbolic link's target.
    pub fn read_link(&self, path: &str) -> OpFuture {
        self.ops.call(names::READ_LINK, vec![Value::text(path)])
    }
}

/// The complete guest-visible namespace produced by initialization.
///
/// Contains exactly `console`, `vlmrunjs`, and the [`BENCH_GLOBALS`] names;
/// this crate adds nothing else and never mutates the surface afterward.
pub struct GlobalSurface {
    console: Rc<Console>,
    vlmrunjs: Rc<VlmRunJs>,
    benchmarks: BTreeMap<&'static str, Value>,
}

impl GlobalSurface {
    /// The restricted console.
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// The `vlmrunjs` utility namespace.
    pub fn vlmrunjs(&self) -> &VlmRunJs {
        &self.vlmrunjs
    }

    /// The value re-published under a benchmarking name. `Undefined` when the
    /// ambient environment never defined it; `None` only for names outside
    /// the fixed list.
    pub fn benchmark_global(&self, name: &str) -> Option<&Value> {
        self.benchmarks.get(name)
    }

    /// Every name installed on the surface.
    pub fn global_names(&self) -> Vec<&'static str> {
        let mut installed = vec!["console", "vlmrunjs"];
        installed.extend(self.benchmarks.keys().copied());
        installed
    }
}

/// Assemble the global surface from host capabilities.
///
/// Runs synchronously, top to bottom: the logging surface first, then the
/// utility namespace, then the benchmarking globals. Each benchmarking copy
/// is independent, and an absent binding installs as `Undefined` rather than
/// failing. Initialization itself cannot fail; the component's only failure
/// path is the logging formatter, at call time.
pub fn init_global_surface(env: &AmbientEnv) -> GlobalSurface {
    let console = Rc::new(Console::new(Rc::clone(&env.print)));

    let vlmrunjs = Rc::new(VlmRunJs::new(
        Rc::clone(&env.performance),
        Rc::clone(&env.ops),
    ));

    let mut benchmarks = BTreeMap::new();
    for name in BENCH_GLOBALS {
        let value = env.bindings.get(name).cloned().unwrap_or(Value::Undefined);
        benchmarks.insert(name, value);
    }

    GlobalSurface {
        console,
        vlmrunjs,
        benchmarks,
    }
}
