// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! A small dynamic RLP item tree.
//!
//! Receipts, transactions, and trie nodes all need either shape-checked
//! decoding of nested lists or structural encoding of ad-hoc lists, which
//! the derive-based `alloy_rlp` traits do not cover. This module layers a
//! generic item tree over `alloy_rlp::Header`.

use alloy_rlp::{length_of_length, Error, Header};

/// One decoded RLP item: a byte string or a list of items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RlpItem {
    /// A byte string.
    Bytes(Vec<u8>),
    /// A list of nested items.
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Decode a complete buffer into one item. Trailing bytes are an error.
    pub(crate) fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let item = Self::decode_any(&mut buf)?;
        if !buf.is_empty() {
            return Err(Error::UnexpectedLength);
        }
        Ok(item)
    }

    fn decode_any(buf: &mut &[u8]) -> Result<Self, Error> {
        let header = Header::decode(buf)?;
        if buf.len() < header.payload_length {
            return Err(Error::InputTooShort);
        }
        let (mut payload, rest) = buf.split_at(header.payload_length);
        *buf = rest;

        if header.list {
            let mut items = Vec::new();
            while !payload.is_empty() {
                items.push(Self::decode_any(&mut payload)?);
            }
            Ok(RlpItem::List(items))
        } else {
            Ok(RlpItem::Bytes(payload.to_vec()))
        }
    }

    /// Length of the encoded payload, excluding the item's own header.
    pub(crate) fn payload_length(&self) -> usize {
        match self {
            RlpItem::Bytes(b) => b.len(),
            RlpItem::List(items) => items.iter().map(RlpItem::rlp_length).sum(),
        }
    }

    /// Total encoded length of the item.
    pub(crate) fn rlp_length(&self) -> usize {
        match self {
            RlpItem::Bytes(b) if b.len() == 1 && b[0] < 0x80 => 1,
            other => {
                let payload = other.payload_length();
                length_of_length(payload) + payload
            }
        }
    }

    /// Append the encoding of the item to `out`.
    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        match self {
            RlpItem::Bytes(b) => {
                if b.len() == 1 && b[0] < 0x80 {
                    out.push(b[0]);
                } else {
                    Header {
                        list: false,
                        payload_length: b.len(),
                    }
                    .encode(out);
                    out.extend_from_slice(b);
                }
            }
            RlpItem::List(items) => {
                Header {
                    list: true,
                    payload_length: self.payload_length(),
                }
                .encode(out);
                for item in items {
                    item.encode(out);
                }
            }
        }
    }

    /// Encode into a fresh buffer.
    pub(crate) fn encoded(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rlp_length());
        self.encode(&mut out);
        out
    }

    /// View as a byte string.
    pub(crate) fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RlpItem::Bytes(b) => Some(b),
            RlpItem::List(_) => None,
        }
    }

    /// View as a list.
    pub(crate) fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            RlpItem::Bytes(_) => None,
            RlpItem::List(items) => Some(items),
        }
    }
}
