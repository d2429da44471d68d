//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Signup and login with argon2 password hashing
//! - `enrollment` - Idempotent enrollment across all enroll paths
//! - `progress` - Per-lesson completion and aggregate recomputation
//! - `checkout` - Gateway checkout creation and payment reconciliation

pub mod auth;
pub mod checkout;
pub mod enrollment;
pub mod progress;
