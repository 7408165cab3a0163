pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod group;
pub mod logging;
