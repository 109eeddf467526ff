// src/lib.rs

pub mod auth;
pub mod chat;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod document;
pub mod errors;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod notify;
pub mod proxy;
pub mod repl;
pub mod session_store;
pub mod storage;
