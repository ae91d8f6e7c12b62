//! Firebase Authentication adapter implementing the token verifier port.

mod dto;
mod token_verifier;

pub use token_verifier::{
    DEFAULT_FIREBASE_JWKS_URL, FirebaseTokenVerifier, FirebaseVerifierConfig,
};
