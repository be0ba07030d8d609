pub mod contract_error;
pub mod error_location;
pub mod redact_error;
