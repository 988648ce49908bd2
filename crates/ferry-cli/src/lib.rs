pub mod commands;
pub mod orchestrator;
