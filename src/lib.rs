//! wasmhost - a host-side system-call layer for sandboxed WebAssembly guests
//!
//! Design principles:
//! - Tractable: a small fixed syscall set, comprehensible by one human
//! - The guest never touches host memory; every offset is checked
//! - Synchronous: one guest thread, one host call at a time
//!
//! The guest speaks `wasi_snapshot_preview1` (the subset listed in [`host`])
//! and runs on the `wasmi` interpreter.

pub mod host;
