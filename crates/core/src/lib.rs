//! storecart Core - Shared cart types.
//!
//! This crate provides the types shared by every storecart component:
//! - `storecart` - Cart manager, lookup client, and durable stores
//! - `storecart-cli` - Command-line host for the cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! Every cart invariant that can be checked without talking to the outside
//! world lives here.
//!
//! # Modules
//!
//! - [`types`] - Product identifiers, prices, products, stock, and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
