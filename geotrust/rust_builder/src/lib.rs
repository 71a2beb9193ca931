//! Flutter-Rust bridge wrapper for geotrust-core.
//!
//! Built through Cargokit as part of the Flutter app. Everything the shell
//! calls lives in [`api`]; the trust logic itself stays in `geotrust-core`.

pub mod api;

pub use geotrust_core::location;
