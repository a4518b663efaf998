//! # DivyaYatri session client
//!
//! Client-side authentication lifecycle for the DivyaYatri temple-discovery
//! and darshan-booking platform: login, registration, social login, logout,
//! access-token refresh, email verification, password flows, and profile
//! management against the platform's REST backend.
//!
//! The heart of the crate is [`session::SessionManager`], which owns the
//! observable session store, keeps the short-lived access token in memory,
//! and relies on the backend's HTTP-only refresh cookie for re-issuance. UI
//! layers subscribe to the store and gate protected views through
//! [`session::guard`].

pub mod cli;
pub mod session;
