//! Chemistry quiz backend: AI-generated questions behind a persistent cache,
//! user progress with derived levels, and a leaderboard.

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logic;
pub mod openai;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod store;
pub mod synth;
pub mod telemetry;
pub mod util;
