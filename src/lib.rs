//! # Shotlist
//!
//! Turn a script into a curated bundle of licensed editorial media.
//!
//! Shotlist asks a generative model for the people mentioned in a script,
//! searches the Getty Images editorial catalogue for videos and photos of
//! each one, lets an operator pick what they want, and writes the picks out
//! as a ZIP archive plus a CSV metadata sheet.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────────┐   ┌───────────┐
//! │  Script  │──▶│ Extractor │──▶│    Search    │──▶│ Selection │
//! │  (text)  │   │  (LLM)    │   │ (per person) │   │  Ledger   │
//! └──────────┘   └───────────┘   └──────┬───────┘   └─────┬─────┘
//!                                       │                 │
//!                                  ┌────▼────┐      ┌─────┴──────┐
//!                                  │ Gateway │      ▼            ▼
//!                                  │ (Getty) │   ┌─────┐    ┌────────┐
//!                                  └─────────┘   │ CSV │    │  ZIP   │
//!                                                └─────┘    └────────┘
//! ```
//!
//! The [`workflow::Workflow`] owns all of this state and gates each step.
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=... GETTY_API_KEY=... GETTY_API_SECRET=...
//! shotlist session                               # interactive
//! shotlist run script.txt --zip out.zip --csv out.csv
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`llm`] | Generative text model abstraction |
//! | [`extractor`] | Script → people |
//! | [`filters`] | Collection toggles and phrase augmentation |
//! | [`gateway`] | Provider search and token exchange |
//! | [`search`] | Per-person search and normalization |
//! | [`selection`] | Selection ledger |
//! | [`export`] | CSV export |
//! | [`bundle`] | ZIP packaging |
//! | [`workflow`] | Step-gated controller |
//! | [`session`] | Interactive command loop |

pub mod bundle;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod filters;
pub mod gateway;
pub mod llm;
pub mod models;
pub mod progress;
pub mod search;
pub mod selection;
pub mod session;
pub mod workflow;
