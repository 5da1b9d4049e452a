//! flagkit - embedded SVG country flags for component-based UIs
//!
//! Features:
//! - Flag SVGs embedded at build time (see `build.rs` and [`codegen`])
//! - Country metadata registry with case-insensitive search
//! - Annotation of flag markup with size, class, style and ARIA attributes
//! - `FlagView` and `CountrySelector` state machines rendering HTML fragments
//! - Optional HTTP asset backend with per-request timeout

pub mod annotate;
pub mod assets;
pub mod codegen;
pub mod config;
pub mod fetch;
pub mod flag;
pub mod library;
pub mod registry;
pub mod selector;

pub use crate::annotate::StyleMap;
pub use crate::assets::{
    flag_count, get_flag, is_valid_country_code, normalize_country_code, AssetError, AssetSource,
    AssetStore, Markup,
};
pub use crate::config::Config;
pub use crate::fetch::HttpAssets;
pub use crate::flag::{FlagProps, FlagState, FlagView, Pending};
pub use crate::library::FlagLibrary;
pub use crate::registry::{CountryInfo, Registry, RegistryError};
pub use crate::selector::{CountrySelector, SelectorProps, SelectorState};
