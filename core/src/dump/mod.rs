//! Process-based dump pipeline.
//!
//! A dump command is spawned with both output streams piped. One worker
//! gzip-compresses stdout into the destination, another forwards stderr
//! lines to a [`DiagnosticSink`]. The orchestrator waits for the process,
//! joins both workers and resolves a single verdict: a compressor failure
//! first, then a non-zero exit code, then success.

mod command;
mod compressor;
mod context;
mod diagnostics;
mod exit;
mod outcome;
mod pipeline;

pub use command::{CommandBuilder, DumpCommand};
pub use compressor::compress;
pub use context::{KillSwitch, ProcessContext};
pub use diagnostics::{drain_diagnostics, DiagnosticSink, TracingSink};
pub use exit::normalize_exit;
pub use outcome::{resolve_verdict, DumpStats, WorkerOutcome};
pub use pipeline::DumpPipeline;
