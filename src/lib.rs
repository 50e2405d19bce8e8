pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod media;
pub mod resources;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;
