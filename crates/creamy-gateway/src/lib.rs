//! HTTP front end for the gateway selector.
//!
//! `GET /` shows the caller's gateway choices; `POST /` with a `gateway`
//! form field switches them. The caller is identified by source address
//! (see [`source::resolve_source`]).

pub mod error;
pub mod render;
pub mod server;
pub mod source;

pub use error::{AppError, StartupError};
pub use server::{AppState, router, serve};
