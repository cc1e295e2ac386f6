//! Canonical domain model for multi-company work attribution.
//!
//! # Responsibility
//! - Define the stored shapes the attribution engine reads and writes.
//! - Keep model-level invariants next to the types that carry them.
//!
//! # Invariants
//! - Every stored entity is identified by a stable UUID.
//! - Every company and employee belongs to exactly one tenant.

pub mod assignment_audit;
pub mod company;
pub mod employee;
pub mod time_record;

use uuid::Uuid;

/// Owning account whose companies and employees are scoped together.
pub type TenantId = Uuid;
