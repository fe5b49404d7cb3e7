//! Per-call conversion state.
//!
//! A [`ConversionContext`] lives for exactly one top-level conversion. It
//! tracks the path of the node being visited (for error messages), the
//! recursion depth, and counters that are folded into the converter's
//! [`ConversionStats`](crate::metrics::ConversionStats) once the call ends.

use std::fmt::Write;

use crate::config::ConverterConfig;
use crate::error::{ConversionError, ConversionResult, ScalarError};

/// One step of the path from the root to the current node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A record field.
    Field(String),
    /// An array element.
    Index(usize),
    /// A map entry.
    Key(String),
}

/// Mutable state for a single conversion. Not shared between calls.
#[derive(Debug)]
pub struct ConversionContext<'a> {
    config: &'a ConverterConfig,
    path: Vec<PathSegment>,
    pub(crate) unknown_fields_dropped: u64,
    pub(crate) temporal_values_omitted: u64,
}

impl<'a> ConversionContext<'a> {
    /// Creates a context positioned at the root.
    #[must_use]
    pub fn new(config: &'a ConverterConfig) -> Self {
        Self {
            config,
            path: Vec::new(),
            unknown_fields_dropped: 0,
            temporal_values_omitted: 0,
        }
    }

    /// Behavior flags for this call.
    #[must_use]
    pub fn config(&self) -> &'a ConverterConfig {
        self.config
    }

    /// Current nesting depth (0 at the root).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Renders the current path, e.g. `order.items[2].sku`. The root is
    /// rendered as `<root>`.
    #[must_use]
    pub fn path(&self) -> String {
        if self.path.is_empty() {
            return "<root>".into();
        }
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Field(name) | PathSegment::Key(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                PathSegment::Index(i) => {
                    let _ = write!(out, "[{i}]");
                }
            }
        }
        out
    }

    /// Runs `f` one level deeper at `segment`, restoring the path after.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::NestingTooDeep`] past the configured
    /// depth, otherwise whatever `f` returns.
    pub fn scoped<T>(
        &mut self,
        segment: PathSegment,
        f: impl FnOnce(&mut Self) -> ConversionResult<T>,
    ) -> ConversionResult<T> {
        self.path.push(segment);
        let result = if self.depth() > self.config.max_depth {
            Err(ConversionError::NestingTooDeep {
                path: self.path(),
                limit: self.config.max_depth,
            })
        } else {
            f(self)
        };
        self.path.pop();
        result
    }

    // ── Error builders ───────────────────────────────────────

    pub(crate) fn type_mismatch(&self, expected: impl Into<String>, found: impl Into<String>) -> ConversionError {
        ConversionError::TypeMismatch {
            path: self.path(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn scalar_error(&self, err: ScalarError) -> ConversionError {
        ConversionError::from_scalar(self.path(), err)
    }

    pub(crate) fn missing_field(&self) -> ConversionError {
        ConversionError::MissingRequiredField { path: self.path() }
    }

    pub(crate) fn no_union_branch(&self, found: &str) -> ConversionError {
        ConversionError::NoMatchingUnionBranch {
            path: self.path(),
            found: found.into(),
        }
    }

    pub(crate) fn invalid_symbol(&self, symbol: &str) -> ConversionError {
        ConversionError::InvalidEnumSymbol {
            path: self.path(),
            symbol: symbol.into(),
        }
    }

    pub(crate) fn temporal_failure(&self, logical_type: &'static str, value: &str) -> ConversionError {
        ConversionError::TemporalDecodeFailure {
            path: self.path(),
            logical_type,
            value: value.into(),
        }
    }

    pub(crate) fn unsupported(&self, detail: impl Into<String>) -> ConversionError {
        ConversionError::UnsupportedSchema {
            path: self.path(),
            detail: detail.into(),
        }
    }
}
