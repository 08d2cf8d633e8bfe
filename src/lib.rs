//! AURA API Library
//!
//! Multi-agent orchestration over a fixed lattice of six role-specialised
//! agents, with session persistence, JWT auth and a websocket broadcast layer.

pub mod agents;
pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod realtime;
