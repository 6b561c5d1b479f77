#[macro_use]
extern crate rocket;

pub mod db;
pub mod entrypoints;
pub mod error;
