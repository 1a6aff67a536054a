pub mod ai;
pub mod app;
pub mod auth;
pub mod bloodtest;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod memory;
pub mod ocr;
pub mod products;
pub mod profile;
pub mod state;
pub mod storage;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;
