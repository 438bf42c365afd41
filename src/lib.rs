//! Taskboard: the Kanban task board of an HR back office.
//!
//! This crate tracks tasks and subtasks, places each task on the personal
//! board of every stakeholder, enforces the status transition guard and the
//! per-assignee daily task limit, and keeps an append-only status audit
//! trail.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory and
//!   `PostgreSQL`)
//!
//! # Modules
//!
//! - [`board`]: Tasks, board placements, services and adapters
//! - [`config`]: TOML configuration for the board services

pub mod board;
pub mod config;
