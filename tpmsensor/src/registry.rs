//! Priority-ordered dispatch between the known wire formats.

use crate::formats::{br, generic, sytpms, tpms16, DecodeError};
use crate::reading::TpmsReading;
use log::warn;
use uuid::Uuid;

/// One of the known format decoders.
///
/// A closed set of variants dispatched through the shared `identify`/`decode`
/// contract, rather than trait objects; new formats are added as variants and
/// can be registered at runtime ahead of the fallback.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decoder {
    Br,
    SyTpms,
    Tpms16,
    Generic,
}

impl Decoder {
    pub fn name(self) -> &'static str {
        match self {
            Self::Br => br::NAME,
            Self::SyTpms => sytpms::NAME,
            Self::Tpms16 => tpms16::NAME,
            Self::Generic => generic::NAME,
        }
    }

    pub fn manufacturer(self) -> &'static str {
        match self {
            Self::Br => br::MANUFACTURER,
            Self::SyTpms => sytpms::MANUFACTURER,
            Self::Tpms16 => tpms16::MANUFACTURER,
            Self::Generic => generic::MANUFACTURER,
        }
    }

    /// Whether this decoder claims the given advertisement evidence. Cheap
    /// and side-effect free; tolerant of a missing name and empty service
    /// list.
    pub fn identify(self, name: Option<&str>, service_uuids: &[Uuid], data: &[u8]) -> bool {
        match self {
            Self::Br => br::identify(name, service_uuids, data),
            Self::SyTpms => sytpms::identify(name, service_uuids, data),
            Self::Tpms16 => tpms16::identify(name, data),
            Self::Generic => generic::identify(data),
        }
    }

    /// Decodes the payload. The name is only consulted by formats which
    /// carry presentation metadata in it.
    pub fn decode(self, data: &[u8], name: Option<&str>) -> Result<TpmsReading, DecodeError> {
        match self {
            Self::Br => br::decode(data),
            Self::SyTpms => sytpms::decode(data),
            Self::Tpms16 => tpms16::decode(data, name),
            Self::Generic => generic::decode(data),
        }
    }
}

/// The ordered list of decoders to try for an advertisement, most specific
/// first, with the generic fallback always last.
#[derive(Clone, Debug)]
pub struct DecoderRegistry {
    decoders: Vec<Decoder>,
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self {
            decoders: vec![
                Decoder::Br,
                Decoder::SyTpms,
                Decoder::Tpms16,
                Decoder::Generic,
            ],
        }
    }

    /// Registers an additional decoder, inserted immediately before the
    /// fallback so that the fallback stays last.
    pub fn register(&mut self, decoder: Decoder) {
        let before_fallback = self.decoders.len() - 1;
        self.decoders.insert(before_fallback, decoder);
    }

    /// Returns the first decoder claiming the given evidence.
    ///
    /// By construction the fallback claims every payload of at least four
    /// bytes, so `None` means either a payload too short to guess at or a
    /// registry whose fallback has been removed.
    pub fn select(
        &self,
        name: Option<&str>,
        service_uuids: &[Uuid],
        data: &[u8],
    ) -> Option<Decoder> {
        self.decoders
            .iter()
            .copied()
            .find(|decoder| decoder.identify(name, service_uuids, data))
    }

    /// Selects and decodes in one step, logging and discarding failures.
    pub fn decode_advertisement(
        &self,
        name: Option<&str>,
        service_uuids: &[Uuid],
        data: &[u8],
    ) -> Option<TpmsReading> {
        let decoder = self.select(name, service_uuids, data)?;
        match decoder.decode(data, name) {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!("Error decoding {} as {}: {}", hex::encode(data), decoder.name(), e);
                None
            }
        }
    }

    /// The (name, manufacturer) pairs of all registered decoders, in
    /// priority order.
    pub fn decoders(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.decoders
            .iter()
            .map(|decoder| (decoder.name(), decoder.manufacturer()))
    }
}
