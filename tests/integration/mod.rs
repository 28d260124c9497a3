//! Integration test suite for govdesk.
//!
//! These tests drive the public API the way the terminal frontend and the
//! one-shot commands do: controllers sharing one page, the proxy server on a
//! real socket, and the HTTP client talking to it.
//!
//! # Test Categories
//!
//! - `chat_flow`: chat and lookup controllers against a scripted assistant
//! - `transition_flow`: grid/tabs handoff with terminal geometry
//! - `proxy_flow`: client → proxy → mocked upstream, end to end
//! - `config_flow`: config and catalog files on disk
//!
//! # CI Compatibility
//!
//! The upstream model API is mocked with wiremock; nothing leaves the machine.

mod fixtures;

mod chat_flow;
mod config_flow;
mod proxy_flow;
mod transition_flow;
