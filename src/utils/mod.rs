pub mod fingerprint;
pub mod tracking;
pub mod validation;

pub use fingerprint::generate_device_fingerprint;
pub use tracking::{DeviceInfo, UtmParams, country_from_language, parse_user_agent, utm_params};
pub use validation::{normalize_email, validate_email, validate_name, validate_phone};
