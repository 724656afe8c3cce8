// SPDX-License-Identifier: LGPL-3.0-only
#![warn(missing_docs)]

//! Default collaborators for `nptk-icons-core`: an XDG icon theme resolver
//! and a raster image decoder.

mod decoder;
mod error;
pub mod io_helpers;
pub mod lookup;
mod resolver;
pub mod theme;

pub use decoder::RasterDecoder;
pub use error::ThemeError;
pub use lookup::{default_search_paths, ThemeLookup, DEFAULT_EXTENSIONS, FALLBACK_THEME};
pub use nptk_icons_core::uri;
pub use resolver::XdgIconResolver;
pub use theme::{DirectoryType, IconContext, IconDirectory, IconTheme};
