//! Advertising data encoding.
//!
//! Advertising data is a concatenation of AD structures laid out as
//! `{length, type, data...}`, where `length` covers the type byte and the data.
//! A legacy advertising PDU carries at most 31 bytes of it.

use heapless::Vec;

use crate::error::ConfigError;

pub const MAX_PAYLOAD_LEN: usize = 31;
/// Every record takes at least two bytes.
pub const MAX_RECORDS: usize = MAX_PAYLOAD_LEN / 2;

pub mod ad_type {
    pub const FLAGS: u8 = 0x01;
    pub const SHORTENED_LOCAL_NAME: u8 = 0x08;
    pub const COMPLETE_LOCAL_NAME: u8 = 0x09;
    pub const MANUFACTURER_SPECIFIC: u8 = 0xFF;
}

pub mod flags {
    pub const LE_LIMITED_DISC_MODE: u8 = 0x01;
    pub const LE_GENERAL_DISC_MODE: u8 = 0x02;
    pub const BR_EDR_NOT_SUPPORTED: u8 = 0x04;
    /// `0x06`
    pub const LE_ONLY_GENERAL_DISC_MODE: u8 = LE_GENERAL_DISC_MODE | BR_EDR_NOT_SUPPORTED;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdRecord<'a> {
    pub ad_type: u8,
    pub data: &'a [u8],
}

impl<'a> AdRecord<'a> {
    /// The length byte as it goes on air.
    pub fn length(&self) -> u8 {
        self.data.len() as u8 + 1
    }

    pub fn encoded_len(&self) -> usize {
        self.data.len() + 2
    }

    /// Splits manufacturer-specific data into its little-endian company identifier and the rest.
    pub fn manufacturer_data(&self) -> Option<(u16, &'a [u8])> {
        if self.ad_type != ad_type::MANUFACTURER_SPECIFIC || self.data.len() < 2 {
            return None;
        }
        Some((
            u16::from_le_bytes([self.data[0], self.data[1]]),
            &self.data[2..],
        ))
    }
}

/// Splits `bytes` into records, rejecting anything that would not be accepted on air.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<AdRecord<'_>, MAX_RECORDS>, ConfigError> {
    if bytes.len() > MAX_PAYLOAD_LEN {
        return Err(ConfigError::PayloadTooLong(bytes.len()));
    }

    let mut records = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let len = bytes[offset] as usize;
        if len == 0 || offset + 1 + len > bytes.len() {
            return Err(ConfigError::MalformedRecord(offset));
        }
        let record = AdRecord {
            ad_type: bytes[offset + 1],
            data: &bytes[offset + 2..offset + 1 + len],
        };
        records
            .push(record)
            .map_err(|_| ConfigError::MalformedRecord(offset))?;
        offset += 1 + len;
    }

    Ok(records)
}

/// Iterator over the records of an already validated payload.
pub struct Records<'a> {
    bytes: &'a [u8],
}

impl<'a> Iterator for Records<'a> {
    type Item = AdRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, rest) = self.bytes.split_first()?;
        let len = len as usize;
        if len == 0 || len > rest.len() {
            self.bytes = &[];
            return None;
        }
        let (record, tail) = rest.split_at(len);
        self.bytes = tail;
        Some(AdRecord {
            ad_type: record[0],
            data: &record[1..],
        })
    }
}

/// Encoded advertising data. Immutable once built.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingPayload {
    buf: [u8; MAX_PAYLOAD_LEN],
    len: usize,
}

impl AdvertisingPayload {
    /// Takes an already encoded buffer, e.g. a hand-written byte array.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        parse_records(bytes)?;

        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            buf,
            len: bytes.len(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn records(&self) -> Records<'_> {
        Records {
            bytes: self.as_bytes(),
        }
    }

    /// Finds the first record of the given type.
    pub fn find(&self, ad_type: u8) -> Option<AdRecord<'_>> {
        self.records().find(|r| r.ad_type == ad_type)
    }
}

impl core::fmt::Debug for AdvertisingPayload {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("AdvertisingPayload")
            .field(&self.as_bytes())
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AdvertisingPayload {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=[u8]:02x}", self.as_bytes())
    }
}

/// Builds advertising data in a `const` context.
///
/// Every method panics when the record would not fit. Used to initialise a
/// `const` or `static`, that panic is a compile error, so an oversized
/// configuration never makes it into a firmware image:
///
/// ```
/// use libbeacon::payload::{flags, AdvertisingPayload, PayloadBuilder};
///
/// const PAYLOAD: AdvertisingPayload = PayloadBuilder::new()
///     .flags(flags::LE_ONLY_GENERAL_DISC_MODE)
///     .short_name(b"beacon")
///     .build();
///
/// assert_eq!(PAYLOAD.len(), 11);
/// ```
///
/// A name that pushes the payload past 31 bytes fails to build:
///
/// ```compile_fail
/// use libbeacon::payload::{flags, AdvertisingPayload, PayloadBuilder};
///
/// static TOO_LONG: AdvertisingPayload = PayloadBuilder::new()
///     .flags(flags::LE_ONLY_GENERAL_DISC_MODE)
///     .complete_name(b"a name that is far too long for a legacy PDU")
///     .build();
/// ```
#[derive(Clone, Copy)]
pub struct PayloadBuilder {
    buf: [u8; MAX_PAYLOAD_LEN],
    len: usize,
}

impl PayloadBuilder {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_PAYLOAD_LEN],
            len: 0,
        }
    }

    /// Bytes still free in the payload.
    pub const fn remaining(&self) -> usize {
        MAX_PAYLOAD_LEN - self.len
    }

    /// Whether a record with `data_len` bytes of data still fits.
    pub const fn fits(&self, data_len: usize) -> bool {
        data_len + 2 <= self.remaining()
    }

    const fn header(mut self, ad_type: u8, data_len: usize) -> Self {
        if !self.fits(data_len) {
            panic!("advertising payload does not fit in 31 bytes");
        }
        self.buf[self.len] = (data_len + 1) as u8;
        self.buf[self.len + 1] = ad_type;
        self.len += 2;
        self
    }

    const fn bytes(mut self, data: &[u8]) -> Self {
        let mut i = 0;
        while i < data.len() {
            self.buf[self.len] = data[i];
            self.len += 1;
            i += 1;
        }
        self
    }

    pub const fn record(self, ad_type: u8, data: &[u8]) -> Self {
        self.header(ad_type, data.len()).bytes(data)
    }

    pub const fn flags(self, flags: u8) -> Self {
        self.record(ad_type::FLAGS, &[flags])
    }

    /// Manufacturer-specific data, prefixed with the company identifier in little endian.
    pub const fn manufacturer_data(self, company: u16, data: &[u8]) -> Self {
        self.header(ad_type::MANUFACTURER_SPECIFIC, 2 + data.len())
            .bytes(&company.to_le_bytes())
            .bytes(data)
    }

    pub const fn short_name(self, name: &[u8]) -> Self {
        self.record(ad_type::SHORTENED_LOCAL_NAME, name)
    }

    pub const fn complete_name(self, name: &[u8]) -> Self {
        self.record(ad_type::COMPLETE_LOCAL_NAME, name)
    }

    pub const fn beacon_info(self, company: u16, info: &BeaconInfo) -> Self {
        self.manufacturer_data(company, &info.encode())
    }

    pub const fn build(self) -> AdvertisingPayload {
        AdvertisingPayload {
            buf: self.buf,
            len: self.len,
        }
    }
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Beacon information block carried in manufacturer-specific data.
///
/// Layout: device type, length of the rest (`0x15`), 128-bit UUID, major and
/// minor (big endian), and the measured RSSI at 1 m.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BeaconInfo {
    pub device_type: u8,
    pub uuid: [u8; 16],
    pub major: u16,
    pub minor: u16,
    pub measured_rssi: i8,
}

impl BeaconInfo {
    pub const ENCODED_LEN: usize = 23;
    pub const DEVICE_TYPE_BEACON: u8 = 0x02;
    const DATA_LEN: u8 = 0x15;

    pub const fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0] = self.device_type;
        out[1] = Self::DATA_LEN;
        let mut i = 0;
        while i < 16 {
            out[2 + i] = self.uuid[i];
            i += 1;
        }
        let major = self.major.to_be_bytes();
        let minor = self.minor.to_be_bytes();
        out[18] = major[0];
        out[19] = major[1];
        out[20] = minor[0];
        out[21] = minor[1];
        out[22] = self.measured_rssi as u8;
        out
    }

    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() != Self::ENCODED_LEN || data[1] != Self::DATA_LEN {
            return None;
        }
        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&data[2..18]);
        Some(Self {
            device_type: data[0],
            uuid,
            major: u16::from_be_bytes([data[18], data[19]]),
            minor: u16::from_be_bytes([data[20], data[21]]),
            measured_rssi: data[22] as i8,
        })
    }
}
