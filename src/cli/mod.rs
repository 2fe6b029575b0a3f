//! The command-line interface of _bindzone_.

pub mod args;
pub mod commands;
