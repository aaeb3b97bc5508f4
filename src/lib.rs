pub mod config;
pub mod db;
pub mod db_types;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod routes;
pub mod templates;
pub mod types;
pub mod utils;
