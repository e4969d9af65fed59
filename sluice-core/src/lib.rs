//! Sluice Core
//!
//! Core types shared by every Sluice crate.
//!
//! This crate contains:
//! - Domain types: persisted records (Build, Step, Service, Log)
//! - Pipeline types: the pipeline document, templates, rulesets and secrets
//! - DTOs: request and response bodies exchanged with the server

pub mod domain;
pub mod dto;
pub mod pipeline;
