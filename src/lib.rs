//! # Photo Mat
//!
//! Frames photographs on a solid mat: each photo is fitted onto a fixed canvas,
//! optionally with rounded corners, a soft glow behind it and a line of camera
//! exposure data underneath, then exported as JPEG.
//!
//! # Architecture: One Session
//!
//! Everything happens inside a [`session::Session`], which owns the pieces and
//! exposes the user actions:
//!
//! ```text
//!   load_replace / load_append          select_photo / set_option
//!            │                                     │
//!            ▼                                     ▼
//!   ingest (worker pool) ──in order──▶ store ──▶ compositor ──▶ surface
//!                                                                  │
//!                                                   export_current ▼
//!                                                              SaveTarget
//! ```
//!
//! Decoding runs on a private rayon pool, but only the thread that owns the
//! session touches the store, the compositor and the surface. Finished files
//! are published in submission order regardless of which worker was fastest.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Top-level session: the five user actions, batch draining, export |
//! | [`state`] | Start / Loading / Editing / Saving state machine and action gating |
//! | [`store`] | Ordered photo list + selection with an explicit observer interface |
//! | [`ingest`] | Per-file decode and fit, ordered batch worker |
//! | [`compositor`] | Paints one frame: mat, glow, clipped photo, exposure line |
//! | [`export`] | JPEG encoding of the surface and the `SaveTarget` collaborator |
//! | [`metadata`] | Exposure fields from camera tags and the overlay line |
//! | [`naming`] | Export file names (`photo.jpg` → `photo_mat.jpeg`) |
//! | [`imaging`] | Geometry, fit math, decoders, drawing surface, text, raster ops |
//! | [`types`] | Shared types: `SourceFile`, `PhotoRecord`, `DisplayOptions` |
//! | [`config`] | `mat.toml` loading, merging over stock defaults, validation |
//! | [`scan`] | Command-line inputs → ordered file list |
//! | [`output`] | CLI line formatting |
//!
//! # Design Decisions
//!
//! ## Pre-fitted Working Rasters
//!
//! Photos are resampled once, when loaded, to fit a working canvas the size of
//! the output canvas. Re-rendering after an option change only scales an
//! already small raster, so switching mats or toggling the overlay is cheap,
//! and the original file bytes are never kept in memory.
//!
//! ## Scoped Clipping
//!
//! Clips are pushed with [`imaging::Surface::push_clip`], which returns a
//! guard. The clip is popped when the guard drops, so no path through the
//! compositor can leave a clip behind.
//!
//! ## One Batch at a Time
//!
//! A load while another batch is in flight is rejected with
//! [`session::SessionError::BatchInFlight`] rather than queued. The caller
//! sees the rejection immediately and decides whether to wait.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and encoding use the `image` crate, camera tags `kamadak-exif`,
//! drawing `tiny-skia` and text `cosmic-text`. The exposure line is set in a
//! bundled font, so there are no system library or font dependencies.

pub mod compositor;
pub mod config;
pub mod export;
pub mod imaging;
pub mod ingest;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod scan;
pub mod session;
pub mod state;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
