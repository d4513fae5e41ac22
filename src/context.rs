//! Conversion context: quantum depth and the raster layer's exception slot.
//!
//! Raster-layer routines record failures in an [`ExceptionInfo`] and return
//! `None`. Every such call is made through [`Context::guard`], which inspects
//! the slot immediately afterwards: warnings are logged and cleared, errors
//! are cleared and surfaced as a [`RasterError`].

use alloc::format;
use alloc::string::{String, ToString};

use crate::error::RasterError;
use crate::quantum::QuantumDepth;

/// Exception severity, ordered from least to most severe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Undefined,
    Warning,
    Error,
    Fatal,
}

/// Broad origin of an exception.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExceptionClass {
    /// Memory or resource exhaustion.
    ResourceLimit,
    /// Invalid argument to a raster routine.
    Option,
    /// Inconsistent image data (e.g. an out-of-range colormap index).
    CorruptImage,
    #[default]
    Image,
}

/// Exception slot filled in by raster-layer routines.
#[derive(Clone, Debug, Default)]
pub struct ExceptionInfo {
    pub severity: Severity,
    pub class: ExceptionClass,
    pub reason: String,
    pub description: Option<String>,
}

impl ExceptionInfo {
    /// Record an exception. A less severe exception never replaces a more
    /// severe one already pending.
    pub fn throw(
        &mut self,
        severity: Severity,
        class: ExceptionClass,
        reason: &str,
        description: Option<&str>,
    ) {
        if severity < self.severity {
            return;
        }
        self.severity = severity;
        self.class = class;
        self.reason = reason.to_string();
        self.description = description.map(ToString::to_string);
    }

    pub fn is_set(&self) -> bool {
        self.severity != Severity::Undefined
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Explicit replacement for process-wide conversion state.
///
/// Create one per thread of work and pass it `&mut` into every operation.
#[derive(Clone, Debug, Default)]
pub struct Context {
    depth: QuantumDepth,
    exception: ExceptionInfo,
}

impl Context {
    pub fn new(depth: QuantumDepth) -> Self {
        Self {
            depth,
            exception: ExceptionInfo::default(),
        }
    }

    pub fn depth(&self) -> QuantumDepth {
        self.depth
    }

    /// Pending exception, if any routine has recorded one since the last check.
    pub fn exception(&self) -> &ExceptionInfo {
        &self.exception
    }

    pub fn exception_mut(&mut self) -> &mut ExceptionInfo {
        &mut self.exception
    }

    /// Consume the pending exception.
    ///
    /// Warnings are logged and cleared. Errors are cleared and returned;
    /// resource-limit errors become [`RasterError::AllocationFailure`].
    pub fn check(&mut self) -> Result<(), RasterError> {
        let exc = core::mem::take(&mut self.exception);
        match exc.severity {
            Severity::Undefined => Ok(()),
            Severity::Warning => {
                tracing::warn!(
                    class = ?exc.class,
                    reason = %exc.reason,
                    description = exc.description.as_deref().unwrap_or(""),
                    "raster warning"
                );
                Ok(())
            }
            Severity::Error | Severity::Fatal => {
                if exc.class == ExceptionClass::ResourceLimit {
                    let msg = match exc.description {
                        Some(d) => format!("{} ({d})", exc.reason),
                        None => exc.reason,
                    };
                    Err(RasterError::AllocationFailure(msg))
                } else {
                    Err(RasterError::Collaborator {
                        severity: exc.severity,
                        reason: exc.reason,
                        description: exc.description,
                    })
                }
            }
        }
    }

    /// Run one raster-layer call and check the exception slot right after it.
    ///
    /// A `None` result with no error recorded is reported as an allocation
    /// failure of `what`.
    pub fn guard<T>(
        &mut self,
        what: &str,
        call: impl FnOnce(QuantumDepth, &mut ExceptionInfo) -> Option<T>,
    ) -> Result<T, RasterError> {
        let result = call(self.depth, &mut self.exception);
        self.check()?;
        result.ok_or_else(|| RasterError::AllocationFailure(format!("{what} failed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_is_cleared_not_returned() {
        let mut ctx = Context::default();
        ctx.exception_mut().throw(
            Severity::Warning,
            ExceptionClass::CorruptImage,
            "InvalidColormapIndex",
            None,
        );
        assert!(ctx.exception().is_set());
        ctx.check().unwrap();
        assert!(!ctx.exception().is_set());
    }

    #[test]
    fn error_is_returned_and_cleared() {
        let mut ctx = Context::default();
        ctx.exception_mut().throw(
            Severity::Error,
            ExceptionClass::Option,
            "UnableToConstituteImage",
            Some("NonzeroWidthAndHeightRequired"),
        );
        match ctx.check() {
            Err(RasterError::Collaborator {
                severity,
                reason,
                description,
            }) => {
                assert_eq!(severity, Severity::Error);
                assert_eq!(reason, "UnableToConstituteImage");
                assert_eq!(description.as_deref(), Some("NonzeroWidthAndHeightRequired"));
            }
            other => panic!("expected Collaborator, got {other:?}"),
        }
        assert!(!ctx.exception().is_set());
    }

    #[test]
    fn resource_limit_maps_to_allocation_failure() {
        let mut ctx = Context::default();
        let r: Result<(), _> = ctx.guard("allocate", |_, exc| {
            exc.throw(
                Severity::Error,
                ExceptionClass::ResourceLimit,
                "MemoryAllocationFailed",
                None,
            );
            None
        });
        assert!(matches!(r, Err(RasterError::AllocationFailure(_))));
    }

    #[test]
    fn less_severe_does_not_overwrite() {
        let mut exc = ExceptionInfo::default();
        exc.throw(Severity::Error, ExceptionClass::Image, "first", None);
        exc.throw(Severity::Warning, ExceptionClass::Image, "second", None);
        assert_eq!(exc.reason, "first");
        assert_eq!(exc.severity, Severity::Error);
    }

    #[test]
    fn guard_passes_value_through_warning() {
        let mut ctx = Context::new(QuantumDepth::Q8);
        let v = ctx
            .guard("call", |depth, exc| {
                exc.throw(Severity::Warning, ExceptionClass::Image, "meh", None);
                Some(depth.max())
            })
            .unwrap();
        assert_eq!(v, 255);
        assert!(!ctx.exception().is_set());
    }
}
