pub mod export;
pub mod flatten;
pub mod info;
pub mod reset;
pub mod resolve;
pub mod swatch;
