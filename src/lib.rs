pub mod core;
pub mod db;
pub mod fileshare_web_server;
pub mod models;
pub mod routes;
pub mod services;
