//! top-langs: sum the language byte counts of a GitHub account's own
//! repositories and render them as an SVG chart.
//!
//! # Example
//!
//! ```rust
//! use top_langs::languages::{LanguageBytes, aggregate};
//! use top_langs::svg::{ChartOptions, generate_svg};
//!
//! let repo: LanguageBytes = [("Rust".to_string(), 10)].into_iter().collect();
//! let svg = generate_svg(&aggregate([&repo]), ChartOptions::default());
//! assert!(svg.contains("Rust (100.0%)"));
//! ```

pub mod config;
pub mod github;
pub mod languages;
pub mod output;
pub mod pipeline;
pub mod placeholder;
pub mod svg;

pub use github::{ApiError, GithubClient, Repository};
pub use languages::{LanguageBytes, LanguageTotals, Share};
pub use pipeline::{FailurePolicy, RepoSource, collect_totals};
