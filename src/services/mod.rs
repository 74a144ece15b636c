// src/services/mod.rs

pub mod challenge;
pub mod completion;
pub mod practice;
pub mod streak_store;
