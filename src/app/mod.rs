//! Core application modules for GraphDash.
//!
//! # Module Organization
//!
//! ## Graph and Server Plumbing
//! - [`workflow`] - the graph model: nodes, widgets, serialization
//! - [`server_api`] - blocking HTTP client and the error taxonomy
//! - [`resources`] - template and wildcard stores, routes, and async clients
//! - [`execution`] - per-node execution updates and run completion events
//! - [`extensions`] - node lifecycle hooks and the dispatch registry
//!
//! ## UI and Infrastructure
//! - [`graphui`] - egui shell, node canvas, and manager panels
//! - [`notifications`] - notification system for user feedback
//! - [`config`] - server URL and workflow directory settings

pub mod config;
pub mod execution;
pub mod extensions;
pub mod graphui;
pub mod notifications;
pub mod resources;
pub mod server_api;
pub mod workflow;

pub use graphui::app::GraphDashApp;
