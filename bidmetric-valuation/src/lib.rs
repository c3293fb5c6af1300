//! BidMetric Valuation Library
//!
//! Values a property and projects its price over a multi-year horizon from
//! its attributes, macro parameters and a read-only reference snapshot of
//! locality profiles and price history.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  bidmetric-valuation (Rust Library)                 │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ValuationRequest ──► ValuationEngine ◄── ReferenceSnapshot (vN)    │
//! │                            │                                        │
//! │   ┌──────────┐  ┌──────────┴─┐  ┌──────────┐  ┌─────────────────┐   │
//! │   │ Locality │  │  Growth    │  │ Baseline │  │ Forecast        │   │
//! │   │ Profiles │  │  (CAGR)    │  │ (table)  │  │ Confidence      │   │
//! │   └──────────┘  └────────────┘  └──────────┘  │ Explainability  │   │
//! │                                               └─────────────────┘   │
//! │                            ▼                                        │
//! │                     ValuationResult ──► ValuationResponse (JSON)    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! ## Baseline
//! - `area_sqft * base_rate_per_sqft`, then feature multipliers from one table
//! - Rounded to whole rupees once, at the end
//!
//! ## Forecast
//! - One blended growth rate for the whole horizon, clamped to `[0, 15%]`
//! - Locality CAGR, else zone CAGR, else the profile's baseline growth
//! - Optional policy repo rate adjustment
//! - Per-year bands widening 3% a year, confidence falling to 50
//!
//! ## Price Comparison
//! - Valuation against `area * locality rate`: undervalued, fairly valued or
//!   overvalued beyond an 8% band
//! - Optional owner listed price, equal within 2%
//!
//! ## Results
//! - All-or-nothing: a failed request carries no partial trajectory
//! - Data gaps are warnings, never failures
//!
//! # Usage
//!
//! ```ignore
//! use bidmetric_valuation::{ReferenceSnapshot, ValuationEngine, ValuationRequest};
//!
//! let engine = ValuationEngine::new();
//! let snapshot = ReferenceSnapshot::builtin();
//! let request: ValuationRequest = serde_json::from_str(body)?;
//! let result = engine.evaluate(&request, &snapshot);
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod baseline;
pub mod comparison;
pub mod confidence;
pub mod engine;
pub mod error;
pub mod explain;
pub mod forecast;
pub mod growth;
pub mod loader;
pub mod locality;
pub mod response;
pub mod snapshot;
pub mod types;

pub use engine::{EngineConfig, RequestMeta, RequestStage, ValuationEngine};
pub use error::{Result, ValuationError};
pub use locality::{LocalityProfile, LocalityProfileStore, MatchKind};
pub use response::ValuationResponse;
pub use snapshot::{ReferenceSnapshot, SnapshotStore};
pub use types::*;
