//! Broadcast payloads.
//!
//! A broadcast moves one **frame** (a `Vec<u8>`) from root to every rank. The [`Payload`]
//! trait turns a value into such a frame and writes a received frame back into an existing
//! slot. Decoding *into* a slot (rather than producing a fresh value) lets an element that
//! carries per-rank state, such as a nested distributed array with its own backend handle,
//! keep that state while its contents are replaced.
//!
//! Any `serde` type gets a `bincode` encoding for free. Nested distributed arrays implement
//! the trait themselves (see [`crate::array`]).

use crate::store::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A value that can travel in a broadcast frame.
pub trait Payload {
    /// Encodes `self` into a frame.
    fn encode(&self) -> Result<Vec<u8>>;

    /// Overwrites `self` with the value encoded in `frame`.
    fn assign_encoded(&mut self, frame: &[u8]) -> Result<()>;

    /// Decodes a new value from `frame` with no existing slot to decode into.
    ///
    /// Returns `Ok(None)` for types that can only be decoded into an existing value.
    fn decode_owned(frame: &[u8]) -> Result<Option<Self>>
    where
        Self: Sized,
    {
        let _ = frame;
        Ok(None)
    }
}

impl<T> Payload for T
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    fn assign_encoded(&mut self, frame: &[u8]) -> Result<()> {
        *self = bincode::deserialize(frame)?;
        Ok(())
    }

    fn decode_owned(frame: &[u8]) -> Result<Option<Self>> {
        Ok(Some(bincode::deserialize(frame)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ArrayError;
    use serde::Deserialize;

    #[test]
    fn test_scalar_payload() {
        let mut slot = 0i64;
        slot.assign_encoded(&(-42i64).encode().unwrap()).unwrap();
        assert_eq!(slot, -42);
    }

    #[test]
    fn test_variable_size_payload() {
        let mut slot = String::from("short");
        let long = "x".repeat(10_000);
        slot.assign_encoded(&long.encode().unwrap()).unwrap();
        assert_eq!(slot, long);

        let mut rows: Vec<Vec<u16>> = Vec::new();
        let value = vec![vec![1, 2], vec![], vec![3]];
        rows.assign_encoded(&value.encode().unwrap()).unwrap();
        assert_eq!(rows, value);
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Particle {
        id: u32,
        position: (f64, f64),
        tag: Option<String>,
    }

    #[test]
    fn test_struct_payload() {
        let mut slot = Particle {
            id: 0,
            position: (0.0, 0.0),
            tag: None,
        };
        let value = Particle {
            id: 7,
            position: (1.5, -2.0),
            tag: Some("hot".into()),
        };
        slot.assign_encoded(&value.encode().unwrap()).unwrap();
        assert_eq!(slot, value);
    }

    #[test]
    fn test_decode_owned() {
        let frame = vec![3u8, 1, 4].encode().unwrap();
        let decoded = <Vec<u8> as Payload>::decode_owned(&frame).unwrap();
        assert_eq!(decoded, Some(vec![3, 1, 4]));
    }

    #[test]
    fn test_truncated_frame_is_codec_error() {
        let mut slot = String::new();
        let frame = "hello".to_string().encode().unwrap();
        let err = slot.assign_encoded(&frame[..3]).unwrap_err();
        assert!(matches!(err, ArrayError::Codec(_)));
        assert!(!err.is_local());
    }
}
