pub mod api_error;
pub mod config_error;
pub mod db_error;
pub mod error_code;
pub mod refresh_error;
pub mod request_error;
pub mod riot_error;
