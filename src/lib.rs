pub mod admin;
pub mod app;
pub mod attachments;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod feedback;
pub mod notifications;
pub mod pets;
pub mod reports;
pub mod roles;
pub mod settings;
pub mod state;
pub mod storage;
pub mod surveys;
pub mod users;
pub mod webhooks;
