// src/models/mod.rs

pub mod ad;
pub mod category;
pub mod rating;
pub mod response;
pub mod stats;
pub mod user;
