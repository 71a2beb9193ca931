//! GeoTrust Core Library
//!
//! Core functionality for GeoTrust - location trust checks for place-tagged posts.
//! This crate provides the Rust implementation behind the mobile client's
//! location verification.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

mod api;
pub mod location;

pub use api::GeoTrustCore;
