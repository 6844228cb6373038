pub mod axredis;
pub mod database;
