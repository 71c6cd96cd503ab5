//! Snippetbox - share short pieces of text
//!
//! This library provides the core functionality of the Snippetbox web
//! application: persistence, sessions, validation, templates and handlers.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod session;
pub mod templates;
pub mod validator;
pub mod web;
