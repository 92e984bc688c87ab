//! Storefront API Library
//!
//! This crate provides the core functionality for the storefront backend:
//! a cart service and a checkout service that converge on an idempotent
//! checkout ledger, discovering each other through a pluggable service
//! discovery backend.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod discovery;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use tokio::signal;

/// Resolves when the process receives SIGINT or SIGTERM, so both servers
/// can drain in-flight requests before exiting.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
