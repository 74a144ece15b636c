// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod chat;
pub mod daily_challenge;
pub mod practice;
pub mod profile;
pub mod resources;
