//! Utility modules for wallfetch
//!
//! This module contains helpers shared by the three subcommands:
//! - `files`: Output directories, URL file names, retention sweep
//! - `images`: Decoding, square cropping and JPEG output
//! - `http`: HTTP client and per-item downloads

pub mod files;
pub mod http;
pub mod images;
