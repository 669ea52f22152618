//! initracer-proxy - response rewriting for an instrumenting MITM proxy
//!
//! Classifies intercepted response bodies, runs HTML and JavaScript through
//! an external instrumentation tool behind a content-addressed cache, and
//! relaxes the headers that would stop the instrumented code from running.

pub mod cache;
pub mod classify;
pub mod cli;
pub mod config;
pub mod encoding;
pub mod error;
pub mod flow;
pub mod hooks;
pub mod pipeline;
pub mod process;
pub mod ui;

#[cfg(test)]
mod testing;

pub use error::{ProxyError, ProxyResult};
pub use hooks::{FlowHook, Rewriter};
