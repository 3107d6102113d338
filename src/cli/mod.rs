pub mod commands;
pub mod menu;
pub mod prompt;
pub mod sql;
