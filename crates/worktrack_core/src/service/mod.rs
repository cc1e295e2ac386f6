//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into attribution use-cases.
//! - Keep pure derivations (context, distribution, validation, hierarchy)
//!   separate from storage access.

pub mod attribution_service;
pub mod distribution;
pub mod error;
pub mod hierarchy;
pub mod validation;
pub mod work_context;
