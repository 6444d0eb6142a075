pub mod autofill;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod messaging;
pub mod models;
pub mod register;
pub mod routes;
pub mod scanning;
pub mod state;
