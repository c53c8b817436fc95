//! Scripts for deploying and wiring the Mara lending protocol contracts.

#![deny(missing_docs)]

pub mod artifacts;
pub mod cli;
mod commands;
pub mod config;
pub mod constants;
pub mod controller;
pub mod deployer;
pub mod errors;
pub mod fixed_point;
pub mod migration;
pub mod registry;
mod solidity;
pub mod steps;
pub mod utils;

pub use commands::render_plan;
