//! Shared types for the leadpay checkout service.
//!
//! Contains the request/response objects of the HTTP API, the callback
//! signature algorithm, checkout link construction and (behind the `client`
//! feature) a typed client for the payment gateway's Orders API.

#[cfg(feature = "client")]
pub mod client;
pub mod checkout;
pub mod objects;
pub mod signature;
