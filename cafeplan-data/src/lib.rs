//! CSV loading for withholding configuration: federal percentage-method
//! tables and per-state withholding configs.

pub mod loader;

pub use loader::{
    FederalBracketRecord, StateWithholdingRecord, WithholdingLoader, WithholdingLoaderError,
};
