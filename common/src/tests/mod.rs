mod channel;
mod error_location;
mod window_id;
