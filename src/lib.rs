pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod messages;
pub mod poller;
pub mod prompt;
pub mod report;
pub mod state;
pub mod terminal;
pub mod view;
