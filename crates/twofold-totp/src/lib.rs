//! # Twofold – TOTP Account Engine
//!
//! The codec and account-record core of the Twofold authenticator:
//!
//! - **Base32 secrets** – Normalisation and 16/32-character validation
//! - **RFC 6238** – SHA-1, 6-digit, 30-second TOTP generation
//! - **otpauth:// URIs** – Bit-exact encoding and lenient decoding
//! - **Site ranking** – Surface accounts relevant to the current site domain
//! - **Import / Export** – JSON arrays and newline-delimited URI lists
//! - **QR Codes** – PNG / data-URI rendering of provisioning URIs
//! - **Service** – Account list owner with injected store, clock and domain provider

pub mod totp;
