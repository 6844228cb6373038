pub mod encrypt;
pub mod schedule_clock;
pub mod window_policy;
