//! Kanban task board with per-user position ledgers.
//!
//! Every stakeholder of a task (its assignee plus every holder of a
//! privileged role) keeps an independent card for it. Each card records the
//! column and 1-based position on that user's board; positions in a column
//! stay dense and unique. Moving a card re-checks the status transition
//! guard, updates the task status and appends to the status audit log in
//! one unit of work. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
