//! Diagnostic accumulation
//!
//! A [`DiagnosticPool`] collects the diagnostics produced while translating
//! one file. It is an explicit value owned by the caller and lent to the
//! parser, so concurrent translations never share one.
//!
//! # Thresholds
//!
//! Every fatal diagnostic halts the parse. Errors halt once
//! [`DiagnosticLimits::max_errors`] have accumulated (10 by default), warnings
//! once [`DiagnosticLimits::max_warnings`] have (50 by default). Halting is
//! signalled with [`StopSignal`], which carries nothing: the causes are
//! drained from the pool with [`DiagnosticPool::report`].
//!
//! # Speculation
//!
//! [`DiagnosticPool::checkpoint`] snapshots the pool so that diagnostics
//! produced by an abandoned speculative parse can be rolled back with
//! [`DiagnosticPool::restore`].

use crate::source::{Locatable, SourceLocation};
use rustc_hash::FxHashMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Opaque halt raised when a parse cannot or must not continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("translation halted; drain the diagnostic pool for the causes")]
pub struct StopSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fatal,
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "fatal"),
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// What went wrong; only a human-readable message is required.
pub trait DiagnosticKind: fmt::Debug + Send + Sync {
    fn diagnostic_message(&self) -> String;
}

impl<T> DiagnosticKind for T
where
    T: fmt::Display + fmt::Debug + Send + Sync,
{
    fn diagnostic_message(&self) -> String {
        self.to_string()
    }
}

/// A single recorded diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: Arc<dyn DiagnosticKind>,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn message(&self) -> String {
        self.kind.diagnostic_message()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.severity, self.message())
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Diagnostic", 3)?;
        state.serialize_field("severity", &self.severity)?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("location", &self.location)?;
        state.end()
    }
}

/// Sink that receives the diagnostics of one file, in insertion order.
pub trait DiagnosticConsumer {
    fn consume(&mut self, diagnostics: &[Diagnostic]);
}

impl DiagnosticConsumer for Vec<Diagnostic> {
    fn consume(&mut self, diagnostics: &[Diagnostic]) {
        self.extend_from_slice(diagnostics);
    }
}

/// Per-file thresholds after which the pool halts the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticLimits {
    pub max_errors: usize,
    pub max_warnings: usize,
}

impl Default for DiagnosticLimits {
    fn default() -> Self {
        Self {
            max_errors: 10,
            max_warnings: 50,
        }
    }
}

/// Handle returned by [`DiagnosticPool::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckpointId(u64);

#[derive(Debug, Default)]
pub struct DiagnosticPool {
    diagnostics: Vec<Diagnostic>,
    checkpoints: FxHashMap<CheckpointId, Vec<Diagnostic>>,
    next_checkpoint: u64,
    limits: DiagnosticLimits,
}

impl DiagnosticPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: DiagnosticLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> DiagnosticLimits {
        self.limits
    }

    /// Record a fatal diagnostic and hand back the signal to raise.
    pub fn append_fatal(
        &mut self,
        kind: impl DiagnosticKind + 'static,
        at: &impl Locatable,
    ) -> StopSignal {
        self.push(Severity::Fatal, kind, at);
        StopSignal
    }

    /// Record an error; raises once the error limit is reached.
    pub fn append_error(
        &mut self,
        kind: impl DiagnosticKind + 'static,
        at: &impl Locatable,
    ) -> Result<(), StopSignal> {
        self.push(Severity::Error, kind, at);
        if self.error_count() >= self.limits.max_errors {
            return Err(StopSignal);
        }
        Ok(())
    }

    /// Record a warning; raises once the warning limit is reached.
    pub fn append_warning(
        &mut self,
        kind: impl DiagnosticKind + 'static,
        at: &impl Locatable,
    ) -> Result<(), StopSignal> {
        self.push(Severity::Warning, kind, at);
        if self.warning_count() >= self.limits.max_warnings {
            return Err(StopSignal);
        }
        Ok(())
    }

    fn push(&mut self, severity: Severity, kind: impl DiagnosticKind + 'static, at: &impl Locatable) {
        self.diagnostics.push(Diagnostic {
            severity,
            kind: Arc::new(kind),
            location: at.source_location(),
        });
    }

    /// Hand every diagnostic to `consumer`, then clear the pool.
    pub fn report(&mut self, consumer: &mut dyn DiagnosticConsumer) {
        consumer.consume(&self.diagnostics);
        self.clear();
    }

    /// Drop all diagnostics and checkpoints.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.checkpoints.clear();
    }

    pub fn checkpoint(&mut self) -> CheckpointId {
        let id = CheckpointId(self.next_checkpoint);
        self.next_checkpoint += 1;
        self.checkpoints.insert(id, self.diagnostics.clone());
        id
    }

    /// Roll back to the contents captured by `id`. The checkpoint is consumed.
    /// Returns `false` and leaves the pool untouched for an unknown id.
    pub fn restore(&mut self, id: CheckpointId) -> bool {
        match self.checkpoints.remove(&id) {
            Some(snapshot) => {
                self.diagnostics = snapshot;
                true
            }
            None => false,
        }
    }

    /// Forget a checkpoint without rolling back.
    pub fn discard(&mut self, id: CheckpointId) -> bool {
        self.checkpoints.remove(&id).is_some()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_fatal(&self) -> bool {
        self.count(Severity::Fatal) > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}
