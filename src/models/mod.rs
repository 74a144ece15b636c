// src/models/mod.rs

pub mod chat_message;
pub mod daily_challenge;
pub mod learning_resource;
pub mod practice_attempt;
pub mod user;
