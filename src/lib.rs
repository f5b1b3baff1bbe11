// src/lib.rs

//! avisos: Séneca portal pending-messages watcher

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
