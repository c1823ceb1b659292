//! Identity primitives of the bank: access tokens and password hashes.
//!
//! A [`Maker`] issues and verifies access tokens carrying a [`Payload`]. Two
//! formats are available, [`JwtMaker`] (HS256 JWT) and [`PasetoMaker`]
//! (`v2.local` sealed token); callers only see the trait.

pub mod password;
mod token;

pub use password::{PasswordError, check_password, hash_password};
pub use token::{JwtMaker, Maker, PasetoMaker, Payload, TokenError};
