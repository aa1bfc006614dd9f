// Integration tests for the host commands against a stubbed bridge

mod commands;
mod helpers;
mod state;
