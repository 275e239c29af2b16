//! # prefixkv
//!
//! A key-space partitioning layer that lets many logically independent
//! data sets share one physical key-value store, with:
//! - Collision-free, SHA-256-derived key prefixes per logical data set
//! - Zero-allocation key construction on the hot path via buffer pooling
//! - Construction-time compression of nested prefix layers
//! - Batched writes with a replayable, portable write log
//! - Prefix-stripping iteration
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────┐  ┌────────────┐  ┌────────────┐
//! │ Subsystem A│  │ Subsystem B│  │ Subsystem C│
//! └─────┬──────┘  └─────┬──────┘  └─────┬──────┘
//!       │               │               │
//! ┌─────▼──────┐  ┌─────▼──────┐  ┌─────▼──────┐
//! │PrefixedStore│ │PrefixedStore│ │PrefixedStore│
//! │ sha256("a")│  │ sha256("b")│  │ sha256("c")│
//! └─────┬──────┘  └─────┬──────┘  └─────┬──────┘
//!       │               │               │
//!       └───────────────┼───────────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │  Store (one   │
//!               │ physical k/v) │
//!               └───────────────┘
//! ```
//!
//! Each view routes point operations, batches, and iterators through the
//! same pooled key-construction algorithm; the wrapped store never sees
//! unprefixed keys and this layer never touches its values.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod pool;
pub mod store;
pub mod prefix;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::Config;
pub use pool::BufferPool;
pub use store::{Batch, ErrorIterator, KeyValueWriter, MemStore, Store, StoreIterator};
pub use prefix::{PrefixBatch, PrefixIterator, PrefixedStore, PREFIX_LEN};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of prefixkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
