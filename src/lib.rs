// Library exports for the self-playing snake
// This allows the server, the replay tool and the simulator to share the core logic

#[macro_use]
extern crate rocket;

pub mod config;
pub mod controller;
pub mod cycle;
pub mod debug_logger;
pub mod driver;
pub mod food;
pub mod handler;
pub mod replay;
pub mod scorer;
pub mod simulation;
pub mod types;
