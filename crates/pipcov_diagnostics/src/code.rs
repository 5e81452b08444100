//! Diagnostic codes with category prefixes for structured event identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Coverage progress, prefixed with `P`.
    Progress,
    /// Path search, prefixed with `R`.
    Route,
    /// LUT/FF allocation and clock binding, prefixed with `A`.
    Alloc,
    /// Relocation onto other coordinates, prefixed with `L`.
    Reloc,
    /// Device data and persisted inputs, prefixed with `I`.
    Input,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Progress => 'P',
            Category::Route => 'R',
            Category::Alloc => 'A',
            Category::Reloc => 'L',
            Category::Input => 'I',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a number.
///
/// Displayed as the prefix followed by a zero-padded 3-digit number, e.g.
/// `P001`, `R004`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

/// A configuration was finished and persisted.
pub const CONFIG_DONE: DiagnosticCode = DiagnosticCode::new(Category::Progress, 1);
/// Edge costs were reset after slow progress.
pub const COSTS_RESET: DiagnosticCode = DiagnosticCode::new(Category::Progress, 2);
/// PIPs that no window path can reach.
pub const UNREACHABLE_PIPS: DiagnosticCode = DiagnosticCode::new(Category::Progress, 3);
/// The coverage run finished.
pub const RUN_DONE: DiagnosticCode = DiagnosticCode::new(Category::Progress, 4);
/// A Cut was committed.
pub const CUT_COMMITTED: DiagnosticCode = DiagnosticCode::new(Category::Route, 1);
/// A Cut attempt was abandoned and rolled back.
pub const CUT_ABANDONED: DiagnosticCode = DiagnosticCode::new(Category::Route, 2);
/// A Cut attempt exceeded the length limit.
pub const OVER_LENGTH: DiagnosticCode = DiagnosticCode::new(Category::Route, 3);
/// A fatal bookkeeping collision.
pub const COLLISION: DiagnosticCode = DiagnosticCode::new(Category::Alloc, 1);
/// A relocated configuration was assembled.
pub const RELOCATED: DiagnosticCode = DiagnosticCode::new(Category::Reloc, 1);
/// Aggregated coverage after relocation.
pub const COVERAGE: DiagnosticCode = DiagnosticCode::new(Category::Reloc, 2);
/// A device or persisted file could not be used.
pub const BAD_INPUT: DiagnosticCode = DiagnosticCode::new(Category::Input, 1);
