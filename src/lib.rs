//! choropleth
//!
//! A Rust library for binding tabular data to geographic polygons and
//! rendering the result as a choropleth map. Pairs with the `choropleth` CLI.
//!
//! ### Features
//! - Join features to records by key path or by a caller predicate
//! - Auto or explicit domains, quantized or continuous color scales
//! - Legend entries consistent with the color mapping
//! - Mercator / equirectangular projection, graticule, box legends
//! - Layered scene with custom layers and hit-testing for pointer events
//! - SVG/PNG output, CSV/JSON export of the bound features
//!
//! ### Example
//! ```no_run
//! use choropleth::{Choropleth, ChoroplethOptions, DomainSpec};
//!
//! let features = choropleth::storage::load_features("world.geojson")?;
//! let records = choropleth::storage::load_records("population.csv")?;
//! let options = ChoroplethOptions {
//!     match_key: Some("id".into()),
//!     domain: Some(DomainSpec::Explicit { min: 0.0, max: 1.5e9 }),
//!     ..Default::default()
//! };
//! let map = Choropleth::from_options(&options)?.render(&features, &records)?;
//! map.save("population.svg", None)?;
//! let stats = choropleth::stats::binding_summary(&map.binding);
//! println!("{:#?}", stats);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod binder;
pub mod choropleth;
pub mod config;
pub mod error;
pub mod format;
pub mod interaction;
pub mod matcher;
pub mod models;
pub mod projection;
pub mod scale;
pub mod schemes;
pub mod stats;
pub mod storage;
pub mod style;
pub mod viz;

pub use binder::{Binder, Binding, BoundFeature, LabelAccessor, ValueAccessor};
pub use choropleth::{Choropleth, RenderedMap};
pub use config::{ChoroplethConfig, ChoroplethOptions, Margin};
pub use error::ChoroplethError;
pub use format::ValueFormat;
pub use interaction::{InteractionRouter, PointerEvent, TooltipContent, TooltipService};
pub use matcher::MatchRule;
pub use models::{DataRecord, Feature, Geometry};
pub use scale::{ColorScale, ColorScheme, DomainSpec, LegendEntry, ScaleMode};
pub use style::{Color, Theme};
pub use viz::{Layer, Scene, SceneNode};
