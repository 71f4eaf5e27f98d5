#![doc = "The `taskmanager` library crate."]
#![doc = ""]
#![doc = "This crate contains the domain models, the authentication core (password"]
#![doc = "hashing, token issuing and validation, token revocation), routing"]
#![doc = "configuration, and error handling for the task manager API. It is used by"]
#![doc = "the main binary (`main.rs`) to construct and run the application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
