pub mod cache;
pub mod client;
pub mod db;
pub mod error;
pub mod form;
pub mod models;
pub mod reminder;
pub mod routes;
pub mod schedule;
pub mod state;
pub mod whatsapp;
