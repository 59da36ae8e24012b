// src/handlers/mod.rs

pub mod ad;
pub mod auth;
pub mod category;
pub mod rating;
pub mod response;
pub mod search;
pub mod user;
