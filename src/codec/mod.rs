//! Short key codec
//!
//! Short keys are the base62 form of the record id, so generating one
//! never needs a uniqueness check or a retry loop.

pub mod base62;

pub use base62::{ALPHABET, MAX_KEY_LEN, decode, encode, is_valid_key};
