//! Core functionality module
//!
//! This module contains the core business logic for the device setup tool,
//! including configuration management, error handling, the setup routines
//! themselves, and provisioning reports.
//!
//! # Submodules
//!
//! - `config` - Configuration loading, saving, and management
//! - `error` - Error types and result aliases
//! - `setup` - Device setup routines (Wi-Fi, logging, permissions, flags)
//! - `report` - Provisioning report recording and persistence

pub mod config;
pub mod error;
pub mod report;
pub mod setup;
