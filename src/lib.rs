// SPDX-License-Identifier: MIT

//! Approval rules for campus events
//!
//! `engine` decides whether a single stakeholder rule applies to an event.
//! `approval` builds on it: flow definitions, routing an event to every
//! stakeholder that must act, configuration, and the HTTP service.

pub mod approval;
pub mod engine;
