// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors raised by the chain-agnostic monitor foundation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An attested-state field was missing, duplicated, or out of order.
    #[error("attested state is missing field `{0}`")]
    FieldMissing(&'static str),

    /// An attested-state value had an unexpected RLP shape.
    #[error("attested state field `{0}` has an unexpected shape")]
    FieldShape(&'static str),

    /// A session ID did not have the expected 16-byte length.
    #[error("invalid session ID length: {0}")]
    SessionIdLength(usize),

    /// Low-level RLP decoding error.
    #[error(transparent)]
    Rlp(#[from] alloy_rlp::Error),
}
