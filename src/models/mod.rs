pub mod analytics;
pub mod common;
pub mod participation;
pub mod rate_limit;

pub use analytics::*;
pub use common::*;
pub use participation::*;
pub use rate_limit::*;
