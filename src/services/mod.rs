pub mod analytics_service;
pub mod participation_service;
pub mod rate_limit_service;

pub use analytics_service::*;
pub use participation_service::*;
pub use rate_limit_service::*;

#[cfg(test)]
pub(crate) mod test_support;
