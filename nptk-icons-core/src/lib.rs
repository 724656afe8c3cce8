// SPDX-License-Identifier: LGPL-3.0-only
#![warn(missing_docs)]

//! Asynchronous icon-resolution cache.
//!
//! [`IconCache`] turns an icon request (themed name, structured descriptor,
//! file path or URI at a target size) into a decoded [`IconImage`]. Requests
//! for the same resource share one unit of work, resolving and decoding runs
//! on a worker pool, and callbacks are delivered in batches on the thread that
//! owns the cache.
//!
//! The cache does not know how to find or decode icons by itself; it talks to
//! an [`IconResolver`] and an [`ImageDecoder`]. Default implementations live
//! in `nptk-icons-services`.

mod cache;
mod coalescer;
mod handles;
mod queue;
mod resolve;
mod result_cache;
mod unit;
mod worker;

pub mod collaborator;
pub mod composite;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod image;
pub mod request;
pub mod uri;

pub use cache::{IconCache, IconCacheStats};
pub use collaborator::{create_theme_event_channel, IconReference, IconResolver, ImageDecoder, ThemeEvent};
pub use config::IconCacheConfig;
pub use descriptor::{Annotation, Descriptor, Tint};
pub use error::{DecodeError, IconError, RejectReason};
pub use image::IconImage;
pub use request::{Bound, CacheKey, Handle, IconCallback, IconKind, IconRequest};
pub use unit::UnitState;
