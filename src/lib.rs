pub mod client;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod utils;
