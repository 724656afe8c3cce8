#![warn(missing_docs)]

//! Asynchronous icon loading for nptk applications.
//!
//! Request an icon by themed name, structured descriptor, file path or URI
//! and get it back through a callback on the thread running your event loop.
//! Identical requests in flight share one decode, results are cached until
//! the icon theme changes, and decoding never blocks the loop.

pub use nptk_icons_core as core;
#[cfg(feature = "services")]
pub use nptk_icons_services as services;

/// A "prelude" for users of the icon cache.
///
/// ```rust
/// use nptk_icons::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        Bound, Handle, IconCache, IconCacheConfig, IconImage, IconKind, IconReference, IconRequest, IconResolver,
        ImageDecoder, ThemeEvent,
    };

    #[cfg(feature = "services")]
    pub use crate::services::{RasterDecoder, XdgIconResolver};
}
