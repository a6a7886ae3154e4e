pub mod canvas;
pub mod error;
pub mod http;
pub mod models;
pub mod notion;
pub mod services;
