// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Single-header validation against a known parent.

use crate::{
    daa::DaaCalculator,
    error::ValidationError,
    header::HeaderEntry,
    params::Network,
};

/// Validates one header against its parent: number sequence, parent hash,
/// and difficulty per the fork rules of the configured network.
#[derive(Clone, Copy, Debug)]
pub struct Validator {
    network: Network,
}

impl Validator {
    /// A validator for the given network.
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    /// Check that `current` is a well-formed child of `parent`.
    ///
    /// Performed in order:
    /// 1. `current.number == parent.number + 1`
    /// 2. `current.parent_hash` equals the Keccak hash of `parent`'s bytes
    /// 3. difficulty: zero at or past Paris, otherwise exactly the value
    ///    the fork's adjustment algorithm derives from the parent
    pub fn common_validate(
        &self,
        parent: &HeaderEntry,
        current: &HeaderEntry,
    ) -> Result<(), ValidationError> {
        if current.number() != parent.number().wrapping_add(1) {
            return Err(ValidationError::NonSequentialNumber {
                parent: parent.number(),
                got: current.number(),
            });
        }

        // TODO: bound the trusted receive times of live parent/child pairs
        // against the block timestamps (clock-skew check)

        if current.parent_hash() != parent.hash() {
            return Err(ValidationError::ParentHashMismatch(current.number()));
        }

        if self.network.is_paris(current.number()) {
            if current.difficulty() != 0 {
                return Err(ValidationError::NonZeroPosDifficulty(current.number()));
            }
        } else {
            let calculator = DaaCalculator::for_block(self.network, current.number())?;
            let expected = calculator.expected(parent, current);
            if current.difficulty() != expected {
                return Err(ValidationError::DifficultyMismatch {
                    number: current.number(),
                    got: current.difficulty(),
                    expected,
                });
            }
        }

        // TODO: verify the Ethash proof-of-work seal for pre-Merge blocks

        Ok(())
    }
}
