//! A hand-rolled, non-self-describing binary `serde` format: LEB128 varints
//! for lengths and integers, fields written positionally (no field names or
//! tags on the wire), enum variants identified by a varint index.
//!
//! This is the shared backing for both `schema-A-binary` and
//! `schema-B-binary` (see the module doc on [`crate::serialize`] for why).
//! Sequences of unknown length are not supported — `serde`'s derive macros
//! always report `Some(len)` for `Vec`/array/struct/tuple serialization, so
//! this only bites a caller serializing from a lazy iterator via
//! `collect_seq`, which this framework's payload types never do.

use std::fmt;

use bytes::Bytes;
use error_stack::{Report, ResultExt};
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, SeqAccess, Visitor};
use serde::ser::{self, Serialize};

use crate::error::SerializationError;

const CODEC: &str = "compact-binary";

/// Internal error type satisfying both `serde::ser::Error` and
/// `serde::de::Error`; converted to [`SerializationError`] at the public
/// `to_bytes`/`from_slice` boundary.
#[derive(Debug, thiserror::Error)]
pub enum CompactError {
    #[error("{0}")]
    Message(String),
    #[error("unexpected end of input")]
    Eof,
    #[error("sequence length must be known up front")]
    UnknownLength,
    #[error("trailing bytes after value")]
    TrailingBytes,
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,
    #[error("enum variant index {0} out of range")]
    InvalidVariant(u32),
}

impl ser::Error for CompactError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

impl de::Error for CompactError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

/// Encodes `value` with the compact binary format.
///
/// # Errors
///
/// Returns [`SerializationError::Encode`] if `T`'s `Serialize` impl fails.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Bytes, Report<SerializationError>> {
    let mut serializer = Serializer { output: Vec::new() };
    value
        .serialize(&mut serializer)
        .change_context(SerializationError::Encode { codec: CODEC })?;
    Ok(Bytes::from(serializer.output))
}

/// Decodes a `T` from the compact binary format.
///
/// # Errors
///
/// Returns [`SerializationError::Decode`] if `bytes` is malformed or
/// incomplete for `T`.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Report<SerializationError>> {
    let mut deserializer = Deserializer { input: bytes };
    let value = T::deserialize(&mut deserializer).change_context(SerializationError::Decode { codec: CODEC })?;
    if !deserializer.input.is_empty() {
        return Err(Report::new(CompactError::TrailingBytes).change_context(SerializationError::Decode { codec: CODEC }));
    }
    Ok(value)
}

fn write_varint(output: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        output.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

struct Serializer {
    output: Vec<u8>,
}

impl Serializer {
    fn write_bytes(&mut self, bytes: &[u8]) {
        write_varint(&mut self.output, bytes.len() as u64);
        self.output.extend_from_slice(bytes);
    }
}

impl<'a> ser::Serializer for &'a mut Serializer {
    type Error = CompactError;
    type Ok = ();
    type SerializeMap = Compound<'a>;
    type SerializeSeq = Compound<'a>;
    type SerializeStruct = Compound<'a>;
    type SerializeStructVariant = Compound<'a>;
    type SerializeTuple = Compound<'a>;
    type SerializeTupleStruct = Compound<'a>;
    type SerializeTupleVariant = Compound<'a>;

    fn serialize_bool(self, v: bool) -> Result<(), CompactError> {
        self.output.push(u8::from(v));
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<(), CompactError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<(), CompactError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<(), CompactError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<(), CompactError> {
        write_varint(&mut self.output, zigzag_encode(v));
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<(), CompactError> {
        self.output.push(v);
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Result<(), CompactError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<(), CompactError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<(), CompactError> {
        write_varint(&mut self.output, v);
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), CompactError> {
        self.output.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> Result<(), CompactError> {
        self.output.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<(), CompactError> {
        self.serialize_u32(v as u32)
    }

    fn serialize_str(self, v: &str) -> Result<(), CompactError> {
        self.write_bytes(v.as_bytes());
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), CompactError> {
        self.write_bytes(v);
        Ok(())
    }

    fn serialize_none(self) -> Result<(), CompactError> {
        self.output.push(0);
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), CompactError> {
        self.output.push(1);
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), CompactError> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), CompactError> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<(), CompactError> {
        write_varint(&mut self.output, u64::from(variant_index));
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), CompactError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), CompactError> {
        write_varint(&mut self.output, u64::from(variant_index));
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Compound<'a>, CompactError> {
        let len = len.ok_or(CompactError::UnknownLength)?;
        write_varint(&mut self.output, len as u64);
        Ok(Compound { ser: self })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound<'a>, CompactError> {
        Ok(Compound { ser: self })
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, CompactError> {
        Ok(Compound { ser: self })
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, CompactError> {
        write_varint(&mut self.output, u64::from(variant_index));
        Ok(Compound { ser: self })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Compound<'a>, CompactError> {
        let len = len.ok_or(CompactError::UnknownLength)?;
        write_varint(&mut self.output, len as u64);
        Ok(Compound { ser: self })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Compound<'a>, CompactError> {
        Ok(Compound { ser: self })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, CompactError> {
        write_varint(&mut self.output, u64::from(variant_index));
        Ok(Compound { ser: self })
    }
}

struct Compound<'a> {
    ser: &'a mut Serializer,
}

impl ser::SerializeSeq for Compound<'_> {
    type Error = CompactError;
    type Ok = ();

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CompactError> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<(), CompactError> {
        Ok(())
    }
}

impl ser::SerializeTuple for Compound<'_> {
    type Error = CompactError;
    type Ok = ();

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CompactError> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<(), CompactError> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Compound<'_> {
    type Error = CompactError;
    type Ok = ();

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CompactError> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<(), CompactError> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for Compound<'_> {
    type Error = CompactError;
    type Ok = ();

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CompactError> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<(), CompactError> {
        Ok(())
    }
}

impl ser::SerializeMap for Compound<'_> {
    type Error = CompactError;
    type Ok = ();

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), CompactError> {
        key.serialize(&mut *self.ser)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CompactError> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<(), CompactError> {
        Ok(())
    }
}

impl ser::SerializeStruct for Compound<'_> {
    type Error = CompactError;
    type Ok = ();

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _key: &'static str, value: &T) -> Result<(), CompactError> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<(), CompactError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Compound<'_> {
    type Error = CompactError;
    type Ok = ();

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _key: &'static str, value: &T) -> Result<(), CompactError> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<(), CompactError> {
        Ok(())
    }
}

struct Deserializer<'de> {
    input: &'de [u8],
}

impl<'de> Deserializer<'de> {
    fn take(&mut self, len: usize) -> Result<&'de [u8], CompactError> {
        if self.input.len() < len {
            return Err(CompactError::Eof);
        }
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }

    fn read_u8(&mut self) -> Result<u8, CompactError> {
        Ok(self.take(1)?[0])
    }

    fn read_varint(&mut self) -> Result<u64, CompactError> {
        let mut value: u64 = 0;
        for index in 0..10 {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7f) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CompactError::Message("varint too long".to_owned()))
    }

    fn read_bytes(&mut self) -> Result<&'de [u8], CompactError> {
        let len = self.read_varint()? as usize;
        self.take(len)
    }

    fn read_str(&mut self) -> Result<&'de str, CompactError> {
        let bytes = self.read_bytes()?;
        core::str::from_utf8(bytes).map_err(|_| CompactError::InvalidUtf8)
    }
}

impl<'de> de::Deserializer<'de> for &mut Deserializer<'de> {
    type Error = CompactError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, CompactError> {
        Err(CompactError::Message(
            "compact-binary is not self-describing; deserialize_any is unsupported".to_owned(),
        ))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_bool(self.read_u8()? != 0)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_i8(zigzag_decode(self.read_varint()?) as i8)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_i16(zigzag_decode(self.read_varint()?) as i16)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_i32(zigzag_decode(self.read_varint()?) as i32)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_i64(zigzag_decode(self.read_varint()?))
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_u8(self.read_u8()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_u16(self.read_varint()? as u16)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_u32(self.read_varint()? as u32)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_u64(self.read_varint()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("checked length");
        visitor.visit_f32(f32::from_le_bytes(bytes))
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("checked length");
        visitor.visit_f64(f64::from_le_bytes(bytes))
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        let codepoint = self.read_varint()? as u32;
        let ch = char::from_u32(codepoint).ok_or_else(|| CompactError::Message("invalid char codepoint".to_owned()))?;
        visitor.visit_char(ch)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_borrowed_str(self.read_str()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_string(self.read_str()?.to_owned())
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_borrowed_bytes(self.read_bytes()?)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_byte_buf(self.read_bytes()?.to_vec())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        match self.read_u8()? {
            0 => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CompactError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        let len = self.read_varint()? as usize;
        visitor.visit_seq(LenSeq { de: self, remaining: len })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_seq(LenSeq { de: self, remaining: len })
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, CompactError> {
        visitor.visit_seq(LenSeq { de: self, remaining: len })
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        let len = self.read_varint()? as usize;
        visitor.visit_map(LenSeq { de: self, remaining: len })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CompactError> {
        visitor.visit_seq(LenSeq {
            de: self,
            remaining: fields.len(),
        })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CompactError> {
        visitor.visit_enum(EnumAccess { de: self })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_u64(self.read_varint()?)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, CompactError> {
        Err(CompactError::Message(
            "compact-binary cannot skip unknown fields without a schema".to_owned(),
        ))
    }

    serde::forward_to_deserialize_any! {
        i128 u128
    }
}

struct LenSeq<'a, 'de> {
    de: &'a mut Deserializer<'de>,
    remaining: usize,
}

impl<'de> SeqAccess<'de> for LenSeq<'_, 'de> {
    type Error = CompactError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, CompactError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

impl<'de> de::MapAccess<'de> for LenSeq<'_, 'de> {
    type Error = CompactError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, CompactError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, CompactError> {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct EnumAccess<'a, 'de> {
    de: &'a mut Deserializer<'de>,
}

impl<'de> de::EnumAccess<'de> for EnumAccess<'_, 'de> {
    type Error = CompactError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self), CompactError> {
        let index = self.de.read_varint()? as u32;
        let value = seed.deserialize(index.into_deserializer())?;
        Ok((value, self))
    }
}

impl<'de> de::VariantAccess<'de> for EnumAccess<'_, 'de> {
    type Error = CompactError;

    fn unit_variant(self) -> Result<(), CompactError> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, CompactError> {
        seed.deserialize(self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, CompactError> {
        visitor.visit_seq(LenSeq {
            de: self.de,
            remaining: len,
        })
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CompactError> {
        visitor.visit_seq(LenSeq {
            de: self.de,
            remaining: fields.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{from_slice, to_bytes};
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Inner {
        a: i32,
        b: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Shape {
        Circle(f64),
        Rect { w: u32, h: u32 },
        Point,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Outer {
        name: String,
        values: Vec<i64>,
        nested: Option<Inner>,
        map: BTreeMap<String, u32>,
        shape: Shape,
        bytes: Vec<u8>,
    }

    #[test]
    fn round_trips_a_nested_struct() {
        let mut map = BTreeMap::new();
        map.insert("x".to_owned(), 1u32);
        map.insert("y".to_owned(), 2u32);

        let value = Outer {
            name: "hello".to_owned(),
            values: vec![-5, 0, 5, i64::MAX, i64::MIN],
            nested: Some(Inner {
                a: -42,
                b: "inner".to_owned(),
            }),
            map,
            shape: Shape::Rect { w: 3, h: 4 },
            bytes: vec![1, 2, 3, 255],
        };

        let encoded = to_bytes(&value).expect("encode succeeds");
        let decoded: Outer = from_slice(&encoded).expect("decode succeeds");
        assert_eq!(decoded, value);
    }

    #[test]
    fn round_trips_every_enum_variant() {
        for shape in [Shape::Circle(1.5), Shape::Rect { w: 1, h: 2 }, Shape::Point] {
            let encoded = to_bytes(&shape).expect("encode succeeds");
            let decoded: Shape = from_slice(&encoded).expect("decode succeeds");
            assert_eq!(decoded, shape);
        }
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut encoded = to_bytes(&Inner {
            a: 1,
            b: "x".to_owned(),
        })
        .expect("encode succeeds")
        .to_vec();
        encoded.push(0xFF);
        let result: Result<Inner, _> = from_slice(&encoded);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_truncated_input() {
        let encoded = to_bytes(&Inner {
            a: 1,
            b: "longer string".to_owned(),
        })
        .expect("encode succeeds");
        let truncated = &encoded[..encoded.len() - 2];
        let result: Result<Inner, _> = from_slice(truncated);
        assert!(result.is_err());
    }
}
