//! Command implementations
//!
//! Every verb of the command line is an `impl Repository` block in its own
//! module under `porcelain`. Commands write their output through the
//! repository writer and report user-facing failures as
//! [`BitletError`](crate::errors::BitletError).

pub mod porcelain;
