// src/models/mod.rs

pub mod envelope;
pub mod item;
pub mod request;
pub mod user;
