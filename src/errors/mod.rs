pub mod types;

pub use types::DocfreshError;
