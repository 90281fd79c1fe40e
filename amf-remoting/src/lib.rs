//! Encoding and decoding of AMF remoting traffic
//!
//! AMF (Action Message Format) is the compact binary serialization used by
//! Flash and Flex clients. This crate translates between the two wire
//! versions (AMF0 and AMF3, including the mid-packet version switch) and an
//! in-memory value graph, preserving identity sharing and the per-session
//! string/trait/object reference tables, and frames values into the
//! header/message packet envelope remoting gateways exchange.
//!
//! Typed records cross the wire through data contracts: types implementing
//! [`contract::AmfContract`] are registered in a [`contract::Registry`] and
//! bound to trait records by alias.
//!
//! Example of use:
//! ```
//! use amf_remoting::{Codec, CodecOptions};
//! use amf_remoting::contract::Registry;
//!
//! let codec = Codec::new(Registry::new(), CodecOptions::default());
//! let packet = codec.decode_packet(&[0x00, 0x03, 0x00, 0x00, 0x00, 0x00]).expect("Failed to parse packet");
//! assert!(packet.messages.is_empty());
//! ```

pub mod amf0;
pub mod amf3;
pub mod codec;
pub mod contract;
pub mod errors;
pub mod packet;
pub mod types;

mod element_cache;
mod nom_utils;

pub use codec::{Codec, CodecOptions};
