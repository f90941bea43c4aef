pub mod activity;
pub mod approval;
pub mod auth;
pub mod config;
pub mod events;
pub mod issue;
pub mod label;
pub mod message;
pub mod notification;
pub mod project;
pub mod views;
