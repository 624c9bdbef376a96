//! Vigil Core
//!
//! Shared types for the Vigil watching client.
//!
//! This crate contains:
//! - Status taxonomy: server-reported states of long-running computations
//! - Work types: identifiers for the kinds of computations the backend runs
//! - DTOs: request payloads for computation launch endpoints

pub mod dto;
pub mod status;
pub mod work;
