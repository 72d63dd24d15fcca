//! Resample audio files into canonical 16-bit PCM WAV files, and edit PDF
//! documents page by page.
//!
//! The [`audio`] module holds the decoding, resampling and encoding steps,
//! [`convert`] runs them over files and batches, [`pdf`] merges, extracts,
//! rotates and resizes PDF pages, and [`config`] reads the shared
//! `config.toml` used by the CLI and the Web UI.

pub mod audio;
pub mod config;
pub mod convert;
pub mod pdf;

#[cfg(feature = "webui")]
pub mod web;
