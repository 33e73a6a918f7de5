pub mod accounts;
pub mod commands;
pub mod console;
