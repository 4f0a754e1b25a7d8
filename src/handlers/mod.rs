// src/handlers/mod.rs

pub mod attempt;
pub mod course;
pub mod quiz;
pub mod user;
