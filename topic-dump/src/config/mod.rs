//! Configuration module for the topic dump binary.
//! Defines and wires the application-wide dependencies.
mod dependencies;

pub use dependencies::Dependencies;
