//! Adapters: conversions from subsystem errors into [`crate::ApiError`].

mod error_conversions;
