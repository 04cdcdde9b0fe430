//! # gilt-templates
//!
//! Template resolution and live-reload caching for gilt-tui markup.
//!
//! A [`TemplateService`] takes a set of template [`Location`]s, fetches each
//! markup document, splits it into a component and its style fragments,
//! merges inline and remote fragments into one [`CompiledStyleSheet`], and
//! caches the resulting [`CompiledTemplate`] per location. With live reload
//! enabled it keeps re-resolving those locations and notifies registered
//! [`TemplateObserver`]s when a template actually changes.
//!
//! ## Core Systems
//!
//! - **[`service`]**: Orchestrator, cache store, observer registry, live-reload loop
//! - **[`resolve`]**: Document splitting, style merging, batch join
//! - **[`fetch`]**: Fetcher contract, byte sources, byte-level caching fetcher
//! - **[`css`]**: Stylesheet tokenizer, parser and compiled stylesheet
//! - **[`markup`]**: Parsed markup nodes and the parser contract
//! - **[`location`]**: URL-backed cache keys
//! - **[`testing`]**: Scripted fetcher and recording observer for tests

// Foundation
pub mod config;
pub mod error;
pub mod location;
pub mod markup;

// Styles
pub mod css;

// Fetching and resolution
pub mod fetch;
pub mod resolve;

// Service
pub mod service;

// Test doubles
pub mod testing;

pub use config::ServiceConfig;
pub use css::CompiledStyleSheet;
pub use error::{BatchError, TemplateError, TemplateMissing};
pub use fetch::{CachePolicy, CachingFetcher, FetchError, ParsedPayload, ParserKind, ResourceFetcher};
pub use location::Location;
pub use markup::{MarkupParser, ParseError, RawMarkupNode};
pub use resolve::{BatchReport, CompiledTemplate};
pub use service::{LiveReloadHandle, ObserverKey, TemplateObserver, TemplateService};
