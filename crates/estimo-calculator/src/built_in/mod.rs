//! Built-in calculators provided by the Estimo engine.

// Preparation
pub mod dimensions;

// Cost calculators
pub mod digital_print;
pub mod lamination;

// Finalization
pub mod price_markup;

pub use dimensions::DimensionsCalculator;
pub use digital_print::DigitalPrintCalculator;
pub use lamination::LaminationCalculator;
pub use price_markup::PriceMarkupCalculator;
