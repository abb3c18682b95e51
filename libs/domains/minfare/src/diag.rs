//! Opt-in textual diagnostics.
//!
//! A transaction carries at most one active [`DiagnosticType`]. Writers call
//! [`DiagCollector::write`] with a closure so that nothing is formatted when
//! the diagnostic is inactive.

use std::cell::RefCell;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum DiagnosticType {
    /// Minimum fare table matching
    #[strum(serialize = "702")]
    Diagnostic702,
    /// HIP and BHC
    #[strum(serialize = "709")]
    Diagnostic709,
    /// CTM
    #[strum(serialize = "718")]
    Diagnostic718,
    /// COM
    #[strum(serialize = "719")]
    Diagnostic719,
    /// COP
    #[strum(serialize = "760")]
    Diagnostic760,
    /// Intermediate fare selection
    #[strum(serialize = "765")]
    Diagnostic765,
}

impl TryFrom<u16> for DiagnosticType {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        value.to_string().parse().map_err(|_| value)
    }
}

#[derive(Debug, Default)]
pub struct DiagCollector {
    active: Option<DiagnosticType>,
    lines: RefCell<Vec<String>>,
}

impl DiagCollector {
    pub fn new(active: Option<DiagnosticType>) -> Self {
        Self {
            active,
            lines: RefCell::new(Vec::new()),
        }
    }

    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn is_active(&self, diag: DiagnosticType) -> bool {
        self.active == Some(diag)
    }

    pub fn write<F>(&self, diag: DiagnosticType, line: F)
    where
        F: FnOnce() -> String,
    {
        if self.is_active(diag) {
            self.lines.borrow_mut().push(line());
        }
    }

    /// Drains the collected lines
    pub fn take(&self) -> Vec<String> {
        self.lines.take()
    }

    pub fn render(&self) -> String {
        self.lines.borrow().join("\n")
    }
}
