pub mod config;
pub mod fetch;
pub mod guard;
pub mod lenient;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod player;
pub mod roster;
pub mod schedule;
pub mod season;
pub mod team;
pub mod xml;
