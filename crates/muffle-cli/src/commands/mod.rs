pub mod classify;
pub mod config;
pub mod control;
pub mod helpers;
pub mod run;
