//! Data models for Libris entities

pub mod book;
pub mod borrow;
pub mod user;
