// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transaction decoding and transactions-root reconstruction.
//!
//! The typed-envelope byte selects the RLP layout: the `to` and `input`
//! fields sit at positions `(3,5)` for legacy transactions, `(4,6)` for
//! EIP-2930 access-list transactions (`0x01`), and `(5,7)` for EIP-1559
//! dynamic-fee transactions (`0x02`). Anything without a recognized type
//! byte is parsed as legacy.

use alloy_primitives::B256;

use crate::{error::TransactionError, rlp::RlpItem, trie::PatriciaTrie};

/// Envelope version of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxVersion {
    /// Untyped pre-EIP-2718 transaction.
    Legacy,
    /// EIP-2930 access-list transaction (`0x01`).
    AccessList,
    /// EIP-1559 dynamic-fee transaction (`0x02`).
    DynamicFee,
}

impl TxVersion {
    /// `(to, input)` field positions for this version.
    fn field_positions(&self) -> (usize, usize) {
        match self {
            TxVersion::Legacy => (3, 5),
            TxVersion::AccessList => (4, 6),
            TxVersion::DynamicFee => (5, 7),
        }
    }
}

/// One decoded transaction, exposing the callee address and call data.
#[derive(Clone, Debug)]
pub struct Transaction {
    version: TxVersion,
    to: Vec<u8>,
    input: Vec<u8>,
}

impl Transaction {
    /// Decode a raw transaction, stripping the typed-envelope byte if
    /// present.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let (version, body) = match bytes.first() {
            Some(0x01) => (TxVersion::AccessList, &bytes[1..]),
            Some(0x02) => (TxVersion::DynamicFee, &bytes[1..]),
            _ => (TxVersion::Legacy, bytes),
        };

        let item = RlpItem::decode(body)?;
        let fields = item.as_list().ok_or(TransactionError::NotAList)?;
        let (to_idx, input_idx) = version.field_positions();
        if fields.len() <= input_idx {
            return Err(TransactionError::FieldCount {
                got: fields.len(),
                expected: input_idx + 1,
            });
        }

        let to = fields[to_idx]
            .as_bytes()
            .ok_or(TransactionError::NestedListField(to_idx))?
            .to_vec();
        let input = fields[input_idx]
            .as_bytes()
            .ok_or(TransactionError::NestedListField(input_idx))?
            .to_vec();

        Ok(Self { version, to, input })
    }

    /// The envelope version.
    pub fn version(&self) -> TxVersion {
        self.version
    }

    /// The callee contract address bytes; empty for contract creation.
    pub fn contract_addr(&self) -> &[u8] {
        &self.to
    }

    /// The call data passed to the contract.
    pub fn input(&self) -> &[u8] {
        &self.input
    }
}

/// A block's transactions, decoded, plus the trie root rebuilt from the
/// raw bytes.
#[derive(Debug)]
pub struct TransactionSet {
    transactions: Vec<Transaction>,
    root: B256,
}

impl TransactionSet {
    /// Decode every raw transaction and rebuild the transactions trie root
    /// by inserting `(rlp(index), rawTx)` for `index = 0..n`.
    pub fn from_raw_list(raw_txs: &[Vec<u8>]) -> Result<Self, TransactionError> {
        let mut trie = PatriciaTrie::new();
        let mut transactions = Vec::with_capacity(raw_txs.len());

        for (index, raw) in raw_txs.iter().enumerate() {
            trie.put(&alloy_rlp::encode(index as u64), raw);
            transactions.push(Transaction::from_bytes(raw)?);
        }

        Ok(Self {
            transactions,
            root: trie.hash(),
        })
    }

    /// The reconstructed transactions trie root.
    pub fn root(&self) -> B256 {
        self.root
    }

    /// The decoded transactions.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}
