//! Cache Codec Implementations
//!
//! Built-in implementations of the [`CacheCodec`](crate::traits::CacheCodec) trait,
//! plus [`PayloadCodec`], the runtime-selectable codec the cache managers hold.

use std::str::FromStr;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::traits::CacheCodec;

mod json;
pub use json::JsonCodec;

#[cfg(feature = "msgpack")]
mod msgpack;
#[cfg(feature = "msgpack")]
#[cfg_attr(docsrs, doc(cfg(feature = "msgpack")))]
pub use msgpack::MsgPackCodec;

/// Codec chosen at startup (`CACHE_CODEC`)
///
/// `CacheCodec` has generic methods and is not object safe, so the managers
/// dispatch through this enum instead of a trait object.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PayloadCodec {
    #[default]
    Json,
    #[cfg(feature = "msgpack")]
    MsgPack,
}

impl CacheCodec for PayloadCodec {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Self::Json => JsonCodec.serialize(value),
            #[cfg(feature = "msgpack")]
            Self::MsgPack => MsgPackCodec.serialize(value),
        }
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            Self::Json => JsonCodec.deserialize(bytes),
            #[cfg(feature = "msgpack")]
            Self::MsgPack => MsgPackCodec.deserialize(bytes),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Json => JsonCodec.name(),
            #[cfg(feature = "msgpack")]
            Self::MsgPack => MsgPackCodec.name(),
        }
    }
}

impl FromStr for PayloadCodec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            #[cfg(feature = "msgpack")]
            "msgpack" => Ok(Self::MsgPack),
            other => Err(anyhow::anyhow!("unsupported cache codec: {other}")),
        }
    }
}
