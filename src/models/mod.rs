pub mod analysis;
pub mod project;
pub mod report;

pub use analysis::*;
pub use project::*;
pub use report::*;
