use std::collections::BTreeMap;

use prost::bytes::{Buf, BufMut};
use prost::encoding::{encode_key, encode_varint, key_len, WireType};

/// A single unrecognized field value, preserved verbatim so re-encoding the
/// message reproduces byte-identical output for the parts it didn't
/// understand.
///
/// Values (not raw bytes) are what's stored: varint and fixed-width encodings
/// are canonical for a given value, so storing the decoded value and
/// re-encoding it on the way out reproduces the original bytes exactly.
/// Legacy `group` wire-type fields are skipped rather than preserved; they
/// predate proto3 and this crate has no call sites that emit them.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UnknownField {
    Varint(u64),
    Fixed64(u64),
    LengthDelimited(Vec<u8>),
    Fixed32(u32),
}

impl UnknownField {
    fn wire_type(&self) -> WireType {
        match self {
            UnknownField::Varint(_) => WireType::Varint,
            UnknownField::Fixed64(_) => WireType::SixtyFourBit,
            UnknownField::LengthDelimited(_) => WireType::LengthDelimited,
            UnknownField::Fixed32(_) => WireType::ThirtyTwoBit,
        }
    }

    fn encode(&self, number: u32, buf: &mut impl BufMut) {
        encode_key(number, self.wire_type(), buf);
        match self {
            UnknownField::Varint(v) => encode_varint(*v, buf),
            UnknownField::Fixed64(v) => buf.put_u64_le(*v),
            UnknownField::LengthDelimited(bytes) => {
                encode_varint(bytes.len() as u64, buf);
                buf.put_slice(bytes);
            }
            UnknownField::Fixed32(v) => buf.put_u32_le(*v),
        }
    }

    fn encoded_len(&self, number: u32) -> usize {
        key_len(number)
            + match self {
                UnknownField::Varint(v) => prost::encoding::encoded_len_varint(*v),
                UnknownField::Fixed64(_) => 8,
                UnknownField::LengthDelimited(bytes) => {
                    prost::encoding::encoded_len_varint(bytes.len() as u64) + bytes.len()
                }
                UnknownField::Fixed32(_) => 4,
            }
    }
}

/// The unrecognized fields of a [`DynamicMessage`][crate::DynamicMessage],
/// grouped by field number in the order they were first encountered.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct UnknownFieldSet {
    fields: BTreeMap<u32, Vec<UnknownField>>,
}

impl UnknownFieldSet {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn push(&mut self, number: u32, field: UnknownField) {
        self.fields.entry(number).or_default().push(field);
    }

    pub fn clear_field(&mut self, number: u32) {
        self.fields.remove(&number);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &UnknownField)> {
        self.fields
            .iter()
            .flat_map(|(&number, values)| values.iter().map(move |v| (number, v)))
    }

    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.fields.keys().copied()
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        for (&number, values) in &self.fields {
            for value in values {
                value.encode(number, buf);
            }
        }
    }

    pub fn encode_number(&self, number: u32, buf: &mut impl BufMut) {
        if let Some(values) = self.fields.get(&number) {
            for value in values {
                value.encode(number, buf);
            }
        }
    }

    pub fn encoded_len_number(&self, number: u32) -> usize {
        self.fields
            .get(&number)
            .map(|values| values.iter().map(|v| v.encoded_len(number)).sum())
            .unwrap_or(0)
    }

    pub fn encoded_len(&self) -> usize {
        self.fields
            .iter()
            .flat_map(|(&number, values)| values.iter().map(move |v| v.encoded_len(number)))
            .sum()
    }

    /// Consumes one field's payload from `buf`, given its tag has already
    /// been read. `wire_type` determines how the payload is parsed; groups
    /// (wire types 3/4) are skipped using prost's own group-skip logic and
    /// not retained.
    pub fn merge_field(
        &mut self,
        number: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
    ) -> Result<(), prost::DecodeError> {
        match wire_type {
            WireType::Varint => {
                let v = prost::encoding::decode_varint(buf)?;
                self.push(number, UnknownField::Varint(v));
            }
            WireType::SixtyFourBit => {
                if buf.remaining() < 8 {
                    return Err(prost::DecodeError::new("buffer underflow"));
                }
                self.push(number, UnknownField::Fixed64(buf.get_u64_le()));
            }
            WireType::ThirtyTwoBit => {
                if buf.remaining() < 4 {
                    return Err(prost::DecodeError::new("buffer underflow"));
                }
                self.push(number, UnknownField::Fixed32(buf.get_u32_le()));
            }
            WireType::LengthDelimited => {
                let len = prost::encoding::decode_varint(buf)? as usize;
                if buf.remaining() < len {
                    return Err(prost::DecodeError::new("buffer underflow"));
                }
                let mut bytes = vec![0u8; len];
                buf.copy_to_slice(&mut bytes);
                self.push(number, UnknownField::LengthDelimited(bytes));
            }
            WireType::StartGroup | WireType::EndGroup => {
                prost::encoding::skip_field(wire_type, number, buf, prost::encoding::DecodeContext::default())?;
            }
        }
        Ok(())
    }
}
