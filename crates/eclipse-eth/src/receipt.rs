// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Receipt decoding and receipts-root reconstruction.
//!
//! Raw receipts are expected in the form Geth's `debug_getRawReceipts`
//! returns: an EIP-2718 typed envelope (`0x01`/`0x02`/`0x03` prefix byte,
//! stripped before RLP decoding) around the four-field body
//! `[status, cumulativeGasUsed, logsBloom, logs]`. Only the logs are
//! semantically used; the other fields merely participate in the trie
//! root.

use alloy_primitives::{Address, B256};

use crate::{error::ReceiptError, rlp::RlpItem, trie::PatriciaTrie};

const RECEIPT_FIELDS: usize = 4;
const LOGS_IDX: usize = 3;

/// One log entry: `[address, topics, data]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Address of the contract that emitted the log.
    pub address: Address,
    /// Indexed topics, 32 bytes each.
    pub topics: Vec<B256>,
    /// Unindexed payload.
    pub data: Vec<u8>,
}

impl LogEntry {
    fn from_item(item: &RlpItem) -> Result<Self, ReceiptError> {
        let parts = item.as_list().ok_or(ReceiptError::LogShape)?;
        if parts.len() < 3 {
            return Err(ReceiptError::LogShape);
        }

        let addr_bytes = parts[0].as_bytes().ok_or(ReceiptError::LogShape)?;
        let address = Address::try_from(addr_bytes)
            .map_err(|_| ReceiptError::LogAddressLength(addr_bytes.len()))?;

        let topic_items = parts[1].as_list().ok_or(ReceiptError::LogShape)?;
        let mut topics = Vec::with_capacity(topic_items.len());
        for topic in topic_items {
            let bytes = topic.as_bytes().ok_or(ReceiptError::LogShape)?;
            let topic = B256::try_from(bytes)
                .map_err(|_| ReceiptError::LogTopicLength(bytes.len()))?;
            topics.push(topic);
        }

        let data = parts[2].as_bytes().ok_or(ReceiptError::LogShape)?.to_vec();

        Ok(Self {
            address,
            topics,
            data,
        })
    }

    /// Whether this log matches an event subscription: same contract
    /// address, and the wanted topics are a prefix of the log's topics.
    /// An empty topic list matches any log of the contract.
    pub fn is_event_emitted(&self, address: &Address, topics: &[B256]) -> bool {
        if &self.address != address {
            return false;
        }
        if topics.len() > self.topics.len() {
            return false;
        }
        self.topics[..topics.len()] == *topics
    }
}

/// One decoded receipt. Only the logs are retained.
#[derive(Clone, Debug)]
pub struct Receipt {
    logs: Vec<LogEntry>,
}

impl Receipt {
    /// Decode a raw receipt, stripping the typed-envelope byte if present.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReceiptError> {
        let body = strip_envelope(bytes);
        let item = RlpItem::decode(body)?;
        let fields = item.as_list().ok_or(ReceiptError::NotAList)?;
        if fields.len() != RECEIPT_FIELDS {
            return Err(ReceiptError::FieldCount(fields.len()));
        }

        let log_items = fields[LOGS_IDX].as_list().ok_or(ReceiptError::LogShape)?;
        let logs = log_items
            .iter()
            .map(LogEntry::from_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { logs })
    }

    /// The receipt's log entries.
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// All logs matching `(address, topic-prefix)`.
    pub fn search_events<'a>(&'a self, address: &Address, topics: &[B256]) -> Vec<&'a LogEntry> {
        self.logs
            .iter()
            .filter(|log| log.is_event_emitted(address, topics))
            .collect()
    }
}

/// A block's receipts, decoded, plus the trie root rebuilt from the raw
/// bytes.
#[derive(Debug)]
pub struct ReceiptSet {
    receipts: Vec<Receipt>,
    root: B256,
}

impl ReceiptSet {
    /// Decode every raw receipt and rebuild the receipts trie root by
    /// inserting `(rlp(index), rawReceipt)` for `index = 0..n`.
    pub fn from_raw_list(raw_receipts: &[Vec<u8>]) -> Result<Self, ReceiptError> {
        let mut trie = PatriciaTrie::new();
        let mut receipts = Vec::with_capacity(raw_receipts.len());

        for (index, raw) in raw_receipts.iter().enumerate() {
            trie.put(&alloy_rlp::encode(index as u64), raw);
            receipts.push(Receipt::from_bytes(raw)?);
        }

        Ok(Self {
            receipts,
            root: trie.hash(),
        })
    }

    /// The reconstructed receipts trie root.
    pub fn root(&self) -> B256 {
        self.root
    }

    /// The decoded receipts.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// All logs in the block matching `(address, topic-prefix)`, in
    /// receipt order.
    pub fn search_events<'a>(&'a self, address: &Address, topics: &[B256]) -> Vec<&'a LogEntry> {
        self.receipts
            .iter()
            .flat_map(|receipt| receipt.search_events(address, topics))
            .collect()
    }
}

fn strip_envelope(bytes: &[u8]) -> &[u8] {
    match bytes.first() {
        Some(0x01) | Some(0x02) | Some(0x03) => &bytes[1..],
        _ => bytes,
    }
}

/// Test-only raw receipt builder shared across the crate's unit tests.
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// RLP-encode a `[status, cumGas, bloom, logs]` receipt body, with an
    /// optional envelope type byte.
    pub(crate) fn build_receipt(
        envelope: Option<u8>,
        status: u64,
        cumulative_gas: u64,
        bloom: &[u8; 256],
        logs: &[(Address, Vec<B256>, Vec<u8>)],
    ) -> Vec<u8> {
        let logs = RlpItem::List(
            logs.iter()
                .map(|(address, topics, data)| {
                    RlpItem::List(vec![
                        RlpItem::Bytes(address.to_vec()),
                        RlpItem::List(
                            topics.iter().map(|t| RlpItem::Bytes(t.to_vec())).collect(),
                        ),
                        RlpItem::Bytes(data.clone()),
                    ])
                })
                .collect(),
        );
        let body = RlpItem::List(vec![
            RlpItem::Bytes(be_minimal(status)),
            RlpItem::Bytes(be_minimal(cumulative_gas)),
            RlpItem::Bytes(bloom.to_vec()),
            logs,
        ]);
        let mut out = Vec::new();
        if let Some(ty) = envelope {
            out.push(ty);
        }
        body.encode(&mut out);
        out
    }

    fn be_minimal(value: u64) -> Vec<u8> {
        let bytes = value.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        bytes[skip..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::{test_support::build_receipt, *};
    use crate::trie::EMPTY_ROOT_HASH;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn decodes_legacy_receipt_logs() {
        let raw = build_receipt(
            None,
            1,
            21_000,
            &[0u8; 256],
            &[(
                addr(0xAB),
                vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)],
                vec![0xDE, 0xAD],
            )],
        );
        let receipt = Receipt::from_bytes(&raw).unwrap();
        assert_eq!(receipt.logs().len(), 1);
        assert_eq!(receipt.logs()[0].address, addr(0xAB));
        assert_eq!(receipt.logs()[0].topics.len(), 2);
        assert_eq!(receipt.logs()[0].data, vec![0xDE, 0xAD]);
    }

    #[test]
    fn typed_envelope_is_stripped() {
        for ty in [0x01u8, 0x02, 0x03] {
            let raw = build_receipt(Some(ty), 1, 0, &[0u8; 256], &[]);
            let receipt = Receipt::from_bytes(&raw).unwrap();
            assert!(receipt.logs().is_empty());
        }
    }

    #[test]
    fn topic_prefix_rule() {
        let t1 = B256::repeat_byte(0x01);
        let t2 = B256::repeat_byte(0x02);
        let log = LogEntry {
            address: addr(0xAB),
            topics: vec![t1, t2],
            data: vec![],
        };
        assert!(log.is_event_emitted(&addr(0xAB), &[]));
        assert!(log.is_event_emitted(&addr(0xAB), &[t1]));
        assert!(log.is_event_emitted(&addr(0xAB), &[t1, t2]));
        // more wanted topics than present
        assert!(!log.is_event_emitted(&addr(0xAB), &[t1, t2, t1]));
        // wrong order is not a prefix
        assert!(!log.is_event_emitted(&addr(0xAB), &[t2]));
        // wrong contract
        assert!(!log.is_event_emitted(&addr(0xCD), &[t1]));
    }

    #[test]
    fn empty_receipt_list_yields_empty_trie_root() {
        let set = ReceiptSet::from_raw_list(&[]).unwrap();
        assert_eq!(set.root(), EMPTY_ROOT_HASH);
    }

    #[test]
    fn root_matches_independent_ordered_trie() {
        // cross-check our trie against alloy-trie's ordered root builder
        let raws: Vec<Vec<u8>> = (0..20u8)
            .map(|i| {
                build_receipt(
                    if i % 3 == 0 { None } else { Some(0x02) },
                    1,
                    21_000 * i as u64,
                    &[i; 256],
                    &[(addr(i), vec![B256::repeat_byte(i)], vec![i; 3])],
                )
            })
            .collect();

        let set = ReceiptSet::from_raw_list(&raws).unwrap();

        let reference = alloy_trie::root::ordered_trie_root_with_encoder(
            &raws,
            |raw: &Vec<u8>, out: &mut Vec<u8>| out.extend_from_slice(raw),
        );
        assert_eq!(set.root(), reference);
    }

    #[test]
    fn search_spans_all_receipts() {
        let target = addr(0x77);
        let topic = B256::repeat_byte(0x42);
        let raws = vec![
            build_receipt(None, 1, 0, &[0u8; 256], &[(target, vec![topic], vec![1])]),
            build_receipt(None, 1, 0, &[0u8; 256], &[(addr(0x00), vec![topic], vec![2])]),
            build_receipt(None, 1, 0, &[0u8; 256], &[(target, vec![topic], vec![3])]),
        ];
        let set = ReceiptSet::from_raw_list(&raws).unwrap();
        let found = set.search_events(&target, &[topic]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].data, vec![1]);
        assert_eq!(found[1].data, vec![3]);
    }

    #[test]
    fn malformed_receipt_is_rejected() {
        assert!(matches!(
            Receipt::from_bytes(&[0xc1, 0x01]),
            Err(ReceiptError::FieldCount(1))
        ));
        // a bare byte string is not a receipt
        assert!(Receipt::from_bytes(&[0x82, 0x01, 0x02]).is_err());
    }
}
