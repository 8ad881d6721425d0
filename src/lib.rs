pub mod app_system;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod session;
pub mod view;

#[cfg(test)]
mod mock_framework;
#[cfg(test)]
mod integration_tests;
