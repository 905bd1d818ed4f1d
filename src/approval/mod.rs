// SPDX-License-Identifier: MIT

pub mod config;
pub mod flow;
pub mod server;
pub mod store;
