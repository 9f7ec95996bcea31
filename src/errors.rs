// Copyright 2019 Stichting Organism
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors which may occur when parsing keys and/or signatures to or from wire formats,
//! or when a signature fails to verify.

use thiserror::Error;

/// Low level decoding errors. Most application-level developers will likely not
/// need to pay any attention to these.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum InternalError {
    /// An error in the length of bytes handed to a constructor.
    ///
    /// To use this, pass a string specifying the `name` of the type which is
    /// returning the error, and the `length` in bytes which its constructor
    /// expects.
    #[error("{name} must be {length} bytes in length")]
    BytesLengthError {
        /// Identifies the type returning the error
        name: &'static str,
        /// Describes the type returning the error
        description: &'static str,
        /// Length expected by the constructor in bytes
        length: usize,
    },
}

/// Errors raised by the collective signing protocol.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum CosignError {
    /// A commitment or public key in the session did not decode to a curve point
    #[error("Point decoding failed for participant {index}")]
    InvalidPoint {
        /// Position of the participant in the session
        index: usize,
    },

    /// The aggregate signature is shorter than challenge, S and aggNonceCommit
    #[error("Aggregate signature is {length} bytes, at least 96 are required")]
    SignatureTooShort {
        /// Length of the received signature
        length: usize,
    },

    /// Fewer cosigners contributed than the verifier demands
    #[error("Only {enabled} cosigners contributed, {threshold} required")]
    ThresholdNotMet {
        /// Cosigners present in the mask
        enabled: usize,
        /// Cosigners demanded by the verifier
        threshold: usize,
    },

    /// A session needs at least one participant
    #[error("A cosigning session needs at least one participant")]
    NoParticipants,
}

/// Errors raised by the ECDSA key and signature layer.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum EcdsaError {
    /// The algorithm tag is not one this crate implements
    #[error("illegal input parameter {0}")]
    UnsupportedAlgorithm(String),

    /// A secp256k1 public key that is neither an address nor an uncompressed point
    #[error("k length is {0}, maybe should use SECP256K1RECOVER")]
    KeyLength(usize),

    /// An uncompressed public key of the wrong size for its curve
    #[error("public key length is {length}, {expected} expected")]
    PublicKeyLength {
        /// Length of the received encoding
        length: usize,
        /// Length of `0x04 || X || Y` for the curve
        expected: usize,
    },

    /// Uncompressed encodings start with 0x04
    #[error("public key does not start with the uncompressed point tag")]
    PointTag,

    /// Neither ASN.1 DER nor a 65 byte recoverable signature
    #[error("wrong signature format: {0}")]
    SignatureFormat(String),

    /// Verification was asked of a key with no coordinates and no recovery mode
    #[error("key is empty")]
    EmptyKey,

    /// Address-only keys cannot check ASN.1 signatures
    #[error("k1: key is recover mode, but signature is asn1 form")]
    RecoveryKeyWithAsn1,

    /// A 65 byte signature offered to a curve without public key recovery
    #[error("k1: key is not recovery mode, but signature is 65 bytes")]
    NotRecoveryMode,

    /// The signature does not match the key and digest
    #[error("invalid signature")]
    InvalidSignature,

    /// The private scalar is zero, not below the group order, or too long
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// The public point is not on the curve
    #[error("invalid public key")]
    InvalidPublicKey,

    /// The key cannot be used in the requested way
    #[error("public key is in recovery mode and has no coordinates")]
    AddressOnlyKey,

    /// `set_public_key` was handed a key from a different curve
    #[error("public key belongs to {found}, private key to {expected}")]
    CurveMismatch {
        /// Curve of the private key
        expected: &'static str,
        /// Curve of the offered public key
        found: &'static str,
    },

    /// Public key recovery failed
    #[error("public key recovery failed")]
    Recovery,

    /// The underlying signer refused the digest
    #[error("signing failed")]
    Signing,
}

/// Errors which may occur while processing signatures and keypairs.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum SignatureError {
    /// Invalid point provided.
    #[error("Cannot decompress Edwards point")]
    PointDecompressionError,

    /// Invalid scalar provided.
    #[error("Cannot use scalar which is not reduced modulo the group order")]
    ScalarFormatError,

    /// Bad length on a fixed size encoding.
    #[error("length error: {0}")]
    BytesLength(InternalError),

    /// The verification equation wasn't satisfied
    #[error("Verification equation was not satisfied")]
    VerifyError,

    /// Collective signing
    #[error("Cosigning failed: {kind}")]
    Cosign {
        /// What went wrong
        kind: CosignError,
    },

    /// ECDSA
    #[error("{kind}")]
    Ecdsa {
        /// What went wrong
        kind: EcdsaError,
    },
}

impl From<InternalError> for SignatureError {
    fn from(err: InternalError) -> SignatureError {
        SignatureError::BytesLength(err)
    }
}

impl From<CosignError> for SignatureError {
    fn from(err: CosignError) -> SignatureError {
        from_cosign(err)
    }
}

impl From<EcdsaError> for SignatureError {
    fn from(err: EcdsaError) -> SignatureError {
        from_ecdsa(err)
    }
}

/// Helper function to convert a cosigning error into a signature error
pub fn from_cosign(err: CosignError) -> SignatureError {
    SignatureError::Cosign { kind: err }
}

/// Helper function to convert an ECDSA error into a signature error
pub fn from_ecdsa(err: EcdsaError) -> SignatureError {
    SignatureError::Ecdsa { kind: err }
}

/// Convert `SignatureError` into `::serde::de::Error` aka `SerdeError`
///
/// We should do this with `From` but right now the orphan rules prohibit
/// `impl From<SignatureError> for E where E: ::serde::de::Error`.
pub(crate) fn serde_error_from_signature_error<E>(err: SignatureError) -> E
where
    E: ::serde::de::Error,
{
    match err {
        SignatureError::PointDecompressionError => E::custom("Edwards point decompression failed"),
        SignatureError::ScalarFormatError => E::custom("scalar is not reduced modulo the group order"),
        SignatureError::BytesLength(InternalError::BytesLengthError { description, .. }) => {
            E::custom(format_args!("expected {}", description))
        }
        other => E::custom(other),
    }
}
