// src/utils/mod.rs

pub mod jwt;
pub mod query;
pub mod validated_json;
