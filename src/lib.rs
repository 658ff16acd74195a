//! agentwatch - Client for the agent and page-reminder service
//!
//! agentwatch talks to a REST service that hosts knowledge agents (answer
//! questions from scraped web pages) and reminders (watch a URL and mail on
//! change). It owns the client-side session, gates navigation on it, and
//! runs a uniform load/mutate/refresh lifecycle for every resource.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Host (CLI, UI)                          │
//! │        renders notices, asks the Route Guard where to go         │
//! └───────┬──────────────────┬──────────────────────┬────────────────┘
//!         │                  │                      │
//! ┌───────▼───────┐  ┌───────▼────────────┐  ┌──────▼───────┐
//! │ Session Store │  │ Resource Controller│  │ Chat Session │
//! │ bootstrap,    │  │ Agents, Reminders  │  │ per agent    │
//! │ login, logout │  │ load / mutate      │  │ send         │
//! └───────┬───────┘  └───────┬────────────┘  └──────┬───────┘
//!         │ watch<Session>   │                      │
//! ┌───────▼──────────────────▼──────────────────────▼───────┐
//! │                      Request Gateway                    │
//! │   bearer credential from the session, ApiError on fail  │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │ Transport (reqwest)
//!                     ┌───────▼───────┐
//!                     │ Resource API  │
//!                     └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`]: Session state and its lifecycle
//! - [`guard`]: Route parsing and navigation gating
//! - [`gateway`]: Credential injection and error normalization
//! - [`api`]: Endpoint catalog and wire types
//! - [`resources`]: Generic resource controller for agents and reminders
//! - [`chat`]: Per-agent chat log
//! - [`notifier`]: User-facing notices
//! - [`storage`]: Persisted credential
//! - [`config`]: Configuration management

pub mod api;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod notifier;
pub mod resources;
pub mod session;
pub mod storage;

pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use error::{Error, Result};
