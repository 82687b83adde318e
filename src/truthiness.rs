//! Truthiness of cached values, used by the tagged lookup path.
//!
//! The check walks the value's `Serialize` impl with [`TruthSerializer`],
//! which looks only at the outermost value: nested contents are never
//! visited, so any type the cache can store can be tested.

use crate::error::{Error, Result};
use serde::ser::{self, Serialize};
use std::fmt;

/// Whether `value` counts as present.
///
/// `()`, `None`, unit structs, `false`, numeric zero, `""`, `"0"`, `'0'`, and
/// empty sequences, maps or structs are falsy. Everything else is truthy,
/// including `NaN`.
pub fn is_truthy<T: Serialize + ?Sized>(value: &T) -> Result<bool> {
    value
        .serialize(TruthSerializer)
        .map_err(|e| Error::SerializationError(e.0))
}

#[derive(Debug)]
pub struct TruthError(String);

impl fmt::Display for TruthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for TruthError {}

impl ser::Error for TruthError {
    fn custom<M: fmt::Display>(msg: M) -> Self {
        TruthError(msg.to_string())
    }
}

type TruthResult<T> = std::result::Result<T, TruthError>;

/// Serializer whose output is the truthiness of the value it is given.
pub struct TruthSerializer;

/// Counts the entries of a compound value without inspecting them.
pub struct Entries {
    count: usize,
    variant: bool,
}

impl Entries {
    fn new(variant: bool) -> Self {
        Entries { count: 0, variant }
    }

    fn finish(self) -> TruthResult<bool> {
        // Enum variants with data become one-key objects: never empty.
        Ok(self.variant || self.count > 0)
    }
}

fn str_is_truthy(s: &str) -> bool {
    !(s.is_empty() || s == "0")
}

impl ser::Serializer for TruthSerializer {
    type Ok = bool;
    type Error = TruthError;
    type SerializeSeq = Entries;
    type SerializeTuple = Entries;
    type SerializeTupleStruct = Entries;
    type SerializeTupleVariant = Entries;
    type SerializeMap = Entries;
    type SerializeStruct = Entries;
    type SerializeStructVariant = Entries;

    fn serialize_bool(self, v: bool) -> TruthResult<bool> {
        Ok(v)
    }

    fn serialize_i8(self, v: i8) -> TruthResult<bool> {
        Ok(v != 0)
    }

    fn serialize_i16(self, v: i16) -> TruthResult<bool> {
        Ok(v != 0)
    }

    fn serialize_i32(self, v: i32) -> TruthResult<bool> {
        Ok(v != 0)
    }

    fn serialize_i64(self, v: i64) -> TruthResult<bool> {
        Ok(v != 0)
    }

    fn serialize_i128(self, v: i128) -> TruthResult<bool> {
        Ok(v != 0)
    }

    fn serialize_u8(self, v: u8) -> TruthResult<bool> {
        Ok(v != 0)
    }

    fn serialize_u16(self, v: u16) -> TruthResult<bool> {
        Ok(v != 0)
    }

    fn serialize_u32(self, v: u32) -> TruthResult<bool> {
        Ok(v != 0)
    }

    fn serialize_u64(self, v: u64) -> TruthResult<bool> {
        Ok(v != 0)
    }

    fn serialize_u128(self, v: u128) -> TruthResult<bool> {
        Ok(v != 0)
    }

    fn serialize_f32(self, v: f32) -> TruthResult<bool> {
        Ok(v != 0.0)
    }

    fn serialize_f64(self, v: f64) -> TruthResult<bool> {
        Ok(v != 0.0)
    }

    fn serialize_char(self, v: char) -> TruthResult<bool> {
        Ok(v != '0')
    }

    fn serialize_str(self, v: &str) -> TruthResult<bool> {
        Ok(str_is_truthy(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> TruthResult<bool> {
        Ok(!v.is_empty())
    }

    fn serialize_none(self) -> TruthResult<bool> {
        Ok(false)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> TruthResult<bool> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> TruthResult<bool> {
        Ok(false)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> TruthResult<bool> {
        Ok(false)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> TruthResult<bool> {
        Ok(str_is_truthy(variant))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> TruthResult<bool> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> TruthResult<bool> {
        Ok(true)
    }

    fn serialize_seq(self, _len: Option<usize>) -> TruthResult<Entries> {
        Ok(Entries::new(false))
    }

    fn serialize_tuple(self, _len: usize) -> TruthResult<Entries> {
        Ok(Entries::new(false))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> TruthResult<Entries> {
        Ok(Entries::new(false))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> TruthResult<Entries> {
        Ok(Entries::new(true))
    }

    fn serialize_map(self, _len: Option<usize>) -> TruthResult<Entries> {
        Ok(Entries::new(false))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> TruthResult<Entries> {
        Ok(Entries::new(false))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> TruthResult<Entries> {
        Ok(Entries::new(true))
    }
}

impl ser::SerializeSeq for Entries {
    type Ok = bool;
    type Error = TruthError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, _value: &T) -> TruthResult<()> {
        self.count += 1;
        Ok(())
    }

    fn end(self) -> TruthResult<bool> {
        self.finish()
    }
}

impl ser::SerializeTuple for Entries {
    type Ok = bool;
    type Error = TruthError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, _value: &T) -> TruthResult<()> {
        self.count += 1;
        Ok(())
    }

    fn end(self) -> TruthResult<bool> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for Entries {
    type Ok = bool;
    type Error = TruthError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _value: &T) -> TruthResult<()> {
        self.count += 1;
        Ok(())
    }

    fn end(self) -> TruthResult<bool> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for Entries {
    type Ok = bool;
    type Error = TruthError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _value: &T) -> TruthResult<()> {
        self.count += 1;
        Ok(())
    }

    fn end(self) -> TruthResult<bool> {
        self.finish()
    }
}

impl ser::SerializeMap for Entries {
    type Ok = bool;
    type Error = TruthError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, _key: &T) -> TruthResult<()> {
        self.count += 1;
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, _value: &T) -> TruthResult<()> {
        Ok(())
    }

    fn end(self) -> TruthResult<bool> {
        self.finish()
    }
}

impl ser::SerializeStruct for Entries {
    type Ok = bool;
    type Error = TruthError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> TruthResult<()> {
        self.count += 1;
        Ok(())
    }

    fn end(self) -> TruthResult<bool> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for Entries {
    type Ok = bool;
    type Error = TruthError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> TruthResult<()> {
        self.count += 1;
        Ok(())
    }

    fn end(self) -> TruthResult<bool> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Serialize)]
    struct Empty {}

    #[derive(Serialize)]
    struct Marker;

    #[derive(Serialize)]
    struct Stats {
        count: u64,
    }

    #[derive(Serialize)]
    enum Status {
        Idle,
        Busy(u8),
    }

    #[test]
    fn test_falsy_values() {
        assert!(!is_truthy(&0i64).unwrap());
        assert!(!is_truthy(&0.0f64).unwrap());
        assert!(!is_truthy(&false).unwrap());
        assert!(!is_truthy("").unwrap());
        assert!(!is_truthy("0").unwrap());
        assert!(!is_truthy(&'0').unwrap());
        assert!(!is_truthy(&()).unwrap());
        assert!(!is_truthy(&Option::<u8>::None).unwrap());
        assert!(!is_truthy(&Some(0u8)).unwrap());
        assert!(!is_truthy(&Vec::<u8>::new()).unwrap());
        assert!(!is_truthy(&HashMap::<String, u8>::new()).unwrap());
        assert!(!is_truthy(&Empty {}).unwrap());
        assert!(!is_truthy(&Marker).unwrap());
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy(&42u32).unwrap());
        assert!(is_truthy(&-1i32).unwrap());
        assert!(is_truthy(&true).unwrap());
        assert!(is_truthy("00").unwrap());
        assert!(is_truthy(&vec![0u8]).unwrap());
        assert!(is_truthy(&Some(1u8)).unwrap());
        assert!(is_truthy(&Stats { count: 0 }).unwrap());
        assert!(is_truthy(&Status::Idle).unwrap());
        assert!(is_truthy(&Status::Busy(0)).unwrap());
    }

    #[test]
    fn test_nan_is_truthy() {
        assert!(is_truthy(&f64::NAN).unwrap());
        assert!(is_truthy(&f32::NAN).unwrap());
    }

    #[test]
    fn test_maps_with_non_string_keys() {
        let grid: HashMap<(u32, u32), u8> = HashMap::from([((1, 2), 7)]);
        assert!(is_truthy(&grid).unwrap());
        assert!(!is_truthy(&BTreeMap::<(u32, u32), u8>::new()).unwrap());
    }
}
