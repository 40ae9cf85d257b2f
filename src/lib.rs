//! # Linkpage
//!
//! A static generator for single-page "link in bio" sites. A site directory
//! holds two JSON documents and a folder of SVG icons; the build turns them
//! into one self-contained `index.html`.
//!
//! ```text
//! site/
//! ├── linkpage.toml               # Build settings (optional)
//! └── assets/
//!     ├── js/data.json            # Link catalog: mainLinks, socialLinks, projects, …
//!     ├── js/config.json          # Site metadata, profile, footer
//!     └── img/icons/{name}.svg    # One file per icon name
//! ```
//!
//! # Pipeline
//!
//! ```text
//! 1. Load       data.json + config.json  →  AppState   (empty on failure)
//! 2. Publish    AppState                 →  Head       (meta, favicons, manifest, JSON-LD)
//! 3. Render     catalog sections         →  mounts     (cards, social icon row)
//! 4. Wire       rendered page            →  Bindings   (copy, toggle, click logging)
//! 5. Emit       Page                     →  dist/index.html + static assets
//! ```
//!
//! Steps 2 to 4 run behind a failure boundary: an error replaces the main
//! region with a short message and the rest of the page still renders.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`loader`] | `AssetSource` trait, directory source, JSON loading into [`types::AppState`] |
//! | [`icons`] | SVG icon fetching, normalization and per-build cache |
//! | [`favicon`] | Emoji favicons as SVG data URLs plus a rasterized PNG fallback |
//! | [`metadata`] | Keyed `<head>` model and idempotent metadata publishing |
//! | [`render`] | Section table, placeholder reservation, card and icon-row markup |
//! | [`interaction`] | Bindings for `static/page.js`, toast and collapsible state |
//! | [`page`] | Pipeline, failure boundary, HTML document, build and check |
//! | [`config`] | `linkpage.toml` loading, validation and stock defaults |
//! | [`types`] | Serde types for `data.json` and `config.json` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Everything Inline
//!
//! Favicons, the PNG fallback and the web-app manifest are `data:` URLs in
//! the head, and the stylesheet and script are embedded in the document. The
//! only files copied next to `index.html` are the site's own assets.
//!
//! ## Maud for Markup
//!
//! All HTML is built with [Maud](https://maud.lambda.xyz/), so every value
//! taken from the JSON documents is escaped on interpolation.
//!
//! ## Behaviour as Data
//!
//! The generator never emits per-element script. [`interaction::wire`]
//! describes what each element does and `page.js` applies it.

pub mod config;
pub mod favicon;
pub mod icons;
pub mod interaction;
pub mod loader;
pub mod metadata;
pub mod output;
pub mod page;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
