//! # endee-rag
//!
//! Index local text documents into an Endee vector service and retrieve the
//! most relevant lines for a natural-language query.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  data/*.txt │──▶│ Lines+Embed  │──▶│    Endee     │
//! │  data/*.md  │   │ id assignment│   │ vector index │
//! └─────────────┘   └──────┬───────┘   └──────┬───────┘
//!                          │ id|text          │ MessagePack hits
//!                          ▼                  ▼
//!                    ┌────────────┐     ┌────────────┐
//!                    │ id_map.txt │────▶│   search   │
//!                    └────────────┘     └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! endee-rag ingest                          # index every line under ./data
//! endee-rag search how do I rotate keys     # top 5 matching lines
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Vector service error kinds |
//! | [`connector_fs`] | Source file discovery |
//! | [`chunk`] | Line units and insert batches |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`id_map`] | Local id → text store |
//! | [`remote`] | Vector service HTTP client |
//! | [`decode`] | Search response decoder |
//! | [`ingest`] | Ingestion pipeline |
//! | [`search`] | Search pipeline |

pub mod chunk;
pub mod config;
pub mod connector_fs;
pub mod decode;
pub mod embedding;
pub mod error;
pub mod id_map;
pub mod ingest;
pub mod models;
pub mod remote;
pub mod search;
