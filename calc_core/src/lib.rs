//! # calc_core - Unit Conversion and Fraction Engine
//!
//! `calc_core` converts quantities between units of measure, reduces decimals
//! to exact fractions, formats numeric results for display, and keeps a
//! bounded history of recent conversions. All inputs and outputs are
//! JSON-serializable, so results can be handed to any front end unchanged.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Conversion, reduction, and formatting are pure functions
//! - **JSON-First**: Results and settings implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Injected Storage**: The ledger never picks a storage backend itself
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_core::units::{convert_by_id, CategoryId};
//! use calc_core::fraction::to_fraction;
//! use calc_core::format::format_result;
//!
//! let fahrenheit = convert_by_id(100.0, CategoryId::Temperature, "celsius", "fahrenheit")?;
//! assert_eq!(format_result(fahrenheit)?, "212");
//!
//! let reduced = to_fraction(0.75)?;
//! assert_eq!(reduced.fraction.to_string(), "3/4");
//! # Ok::<(), calc_core::errors::CalcError>(())
//! ```
//!
//! ## Modules
//!
//! - [`units`] - Unit catalog and the conversion engine
//! - [`fraction`] - Decimal to fraction reduction
//! - [`format`] - Display formatting of numeric results
//! - [`ledger`] - Bounded recent-conversion history
//! - [`settings`] - JSON settings file
//! - [`errors`] - Structured error types
//! - `file_io` - JSON ledger persistence with atomic saves and locking

pub mod errors;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod format;
pub mod fraction;
pub mod ledger;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{FileLock, JsonFileStore};
pub use format::{format_result, FormatOptions};
pub use fraction::{to_fraction, Fraction, FractionConversion, FractionOptions, MixedNumber};
pub use ledger::{Ledger, LedgerStore, MemoryStore, RecentConversion};
pub use settings::Settings;
pub use units::{convert, convert_by_id, CategoryId, Unit, UnitCategoryDefinition};
