//! GraphDash - Node Workflow Editor Frontend
//!
//! GraphDash is a desktop client for a node-graph workflow server. Workflows
//! are laid out on a pannable canvas; a handful of node types get extra
//! behavior from manager panels layered on top of them:
//!
//! - **Prompt templates**: five-slot prompt nodes whose contents can be
//!   saved to and loaded from named template files on the server
//! - **Wildcard files**: server-side text files whose names can be spliced
//!   into a node's text as `__name__` tokens, plus full file management
//! - **Save and shutdown**: a node that, when it executes server-side,
//!   hands the current workflow back for an autosave-then-shutdown
//! - **Counter reset**: selector nodes whose reset toggle is cleared
//!   automatically after every completed run
//!
//! # Architecture Overview
//!
//! The crate separates the graph model, the HTTP client layer, and the UI:
//!
//! - **Graph model** ([`app::workflow`]): nodes, widgets, and the JSON form
//!   shipped back to the server
//! - **Server access** ([`app::server_api`], [`app::resources`]): blocking
//!   HTTP on worker threads, completions delivered over channels
//! - **Lifecycle extensions** ([`app::extensions`]): per-node-type hooks for
//!   creation, execution output, and run completion
//! - **UI layer** ([`app::graphui`]): egui shell, node canvas, and the
//!   manager panels attached to specific node types

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;

pub use app::graphui::GraphDashApp;
