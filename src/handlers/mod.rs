pub mod health;
pub mod participation;

pub use health::health_config;
pub use participation::participation_config;
