//! Packet layout and encoding
//!
//! Packet format:
//! - SOP (1 byte): 0xA1 start-of-packet marker
//! - TYPE (1 byte): application-defined packet type
//! - LENGTH (1 byte): payload length (0-200)
//! - CRC (2 bytes, little-endian): checksum of TYPE, LENGTH and PAYLOAD
//! - PAYLOAD (0-200 bytes): opaque application data

use heapless::Vec;

use crate::crc::Crc;

/// Start-of-packet marker
pub const SOP: u8 = 0xA1;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 200;

/// Bytes preceding the payload (SOP + TYPE + LENGTH + CRC)
pub const HEADER_SIZE: usize = 5;

/// Maximum complete packet size
pub const MAX_PACKET_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// Errors reported by the encoder
///
/// When one of these is returned, nothing has been written to the
/// destination buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// Payload exceeds the configured maximum
    PayloadTooLarge,
    /// Destination buffer cannot hold the whole packet
    BufferTooSmall,
}

/// Compile-time guard: LENGTH is a single byte on the wire
struct PayloadLimit<const N: usize>;

impl<const N: usize> PayloadLimit<N> {
    const VALID: () = assert!(N <= u8::MAX as usize, "payload limit must fit in one byte");
}

/// Checksum over the covered part of a packet
pub(crate) fn packet_crc(packet_type: u8, length: u8, payload: &[u8]) -> u16 {
    let mut crc = Crc::new();
    crc.update(packet_type);
    crc.update(length);
    crc.update_slice(payload);
    crc.value()
}

/// Serialize a packet into `out`
///
/// Returns the number of bytes written (`HEADER_SIZE + payload.len()`).
pub fn serialize(packet_type: u8, payload: &[u8], out: &mut [u8]) -> Result<usize, SerializeError> {
    serialize_bounded::<MAX_PAYLOAD_SIZE>(packet_type, payload, out)
}

/// Serialize a packet for a link whose payload limit is `N` bytes
pub fn serialize_bounded<const N: usize>(
    packet_type: u8,
    payload: &[u8],
    out: &mut [u8],
) -> Result<usize, SerializeError> {
    #[allow(clippy::let_unit_value)]
    let () = PayloadLimit::<N>::VALID;

    if payload.len() > N {
        return Err(SerializeError::PayloadTooLarge);
    }
    let packet_len = HEADER_SIZE + payload.len();
    if out.len() < packet_len {
        return Err(SerializeError::BufferTooSmall);
    }

    let length = payload.len() as u8;
    let [crc_lo, crc_hi] = packet_crc(packet_type, length, payload).to_le_bytes();

    out[0] = SOP;
    out[1] = packet_type;
    out[2] = length;
    out[3] = crc_lo;
    out[4] = crc_hi;
    out[HEADER_SIZE..packet_len].copy_from_slice(payload);

    Ok(packet_len)
}

/// Packet header as seen on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketHeader {
    /// Start-of-packet marker
    pub sop: u8,
    /// Application packet type
    pub packet_type: u8,
    /// Payload length
    pub length: u8,
    /// Transmitted checksum
    pub crc: u16,
}

impl PacketHeader {
    pub(crate) const fn cleared() -> Self {
        Self {
            sop: 0,
            packet_type: 0,
            length: 0,
            crc: 0,
        }
    }
}

/// A received or constructed packet
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Packet<const N: usize = MAX_PAYLOAD_SIZE> {
    pub(crate) header: PacketHeader,
    pub(crate) payload: Vec<u8, N>,
}

impl<const N: usize> Packet<N> {
    /// Create a packet with the given type and payload
    pub fn new(packet_type: u8, payload: &[u8]) -> Result<Self, SerializeError> {
        #[allow(clippy::let_unit_value)]
        let () = PayloadLimit::<N>::VALID;

        let payload = Vec::from_slice(payload).map_err(|_| SerializeError::PayloadTooLarge)?;
        let length = payload.len() as u8;

        Ok(Self {
            header: PacketHeader {
                sop: SOP,
                packet_type,
                length,
                crc: packet_crc(packet_type, length, &payload),
            },
            payload,
        })
    }

    /// Create a packet with no payload
    pub fn empty(packet_type: u8) -> Self {
        Self {
            header: PacketHeader {
                sop: SOP,
                packet_type,
                length: 0,
                crc: packet_crc(packet_type, 0, &[]),
            },
            payload: Vec::new(),
        }
    }

    pub(crate) const fn cleared() -> Self {
        Self {
            header: PacketHeader::cleared(),
            payload: Vec::new(),
        }
    }

    pub fn header(&self) -> &PacketHeader {
        &self.header
    }

    pub fn packet_type(&self) -> u8 {
        self.header.packet_type
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Check the header checksum against the packet contents
    pub fn is_valid(&self) -> bool {
        self.header.length as usize == self.payload.len()
            && self.header.crc == packet_crc(self.header.packet_type, self.header.length, &self.payload)
    }

    /// Encode this packet into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, SerializeError> {
        serialize_bounded::<N>(self.header.packet_type, &self.payload, buffer)
    }
}

impl Packet<MAX_PAYLOAD_SIZE> {
    /// Encode this packet into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_PACKET_SIZE>, SerializeError> {
        let mut buffer = [0u8; MAX_PACKET_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| SerializeError::BufferTooSmall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_empty_payload() {
        let mut buffer = [0u8; 10];
        let len = serialize(0x20, &[], &mut buffer).unwrap();

        assert_eq!(len, 5);
        assert_eq!(buffer[0], SOP);
        assert_eq!(buffer[1], 0x20); // type
        assert_eq!(buffer[2], 0); // length
        assert_eq!(u16::from_le_bytes([buffer[3], buffer[4]]), 0xD38B);
    }

    #[test]
    fn test_serialize_with_payload() {
        let mut buffer = [0u8; 16];
        let len = serialize(0x02, &[1, 2, 3], &mut buffer).unwrap();

        assert_eq!(len, 8);
        assert_eq!(&buffer[..8], &[SOP, 0x02, 0x03, 0x3A, 0x58, 1, 2, 3]);
        assert_eq!(&buffer[8..], &[0u8; 8]);
    }

    #[test]
    fn test_serialize_max_payload() {
        let payload = [0x5Au8; MAX_PAYLOAD_SIZE];
        let mut buffer = [0u8; MAX_PACKET_SIZE];
        let len = serialize(0xFF, &payload, &mut buffer).unwrap();

        assert_eq!(len, MAX_PACKET_SIZE);
        assert_eq!(buffer[2], MAX_PAYLOAD_SIZE as u8);
    }

    #[test]
    fn test_serialize_oversized_writes_nothing() {
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let mut buffer = [0xEEu8; MAX_PACKET_SIZE + 8];
        let result = serialize(0x01, &payload, &mut buffer);

        assert_eq!(result, Err(SerializeError::PayloadTooLarge));
        assert!(buffer.iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn test_serialize_short_buffer_writes_nothing() {
        let mut buffer = [0xEEu8; 7];
        let result = serialize(0x01, &[1, 2, 3], &mut buffer);

        assert_eq!(result, Err(SerializeError::BufferTooSmall));
        assert_eq!(buffer, [0xEE; 7]);
    }

    #[test]
    fn test_serialize_bounded_limit() {
        let mut buffer = [0u8; 32];
        assert_eq!(
            serialize_bounded::<4>(0x01, &[0; 5], &mut buffer),
            Err(SerializeError::PayloadTooLarge)
        );
        assert_eq!(serialize_bounded::<4>(0x01, &[0; 4], &mut buffer), Ok(9));
    }

    #[test]
    fn test_packet_new_and_encode() {
        let packet: Packet = Packet::new(0x02, &[1, 2, 3]).unwrap();
        assert_eq!(packet.packet_type(), 0x02);
        assert_eq!(packet.len(), 3);
        assert_eq!(packet.header().crc, 0x583A);
        assert!(packet.is_valid());

        let encoded = packet.encode_to_vec().unwrap();
        assert_eq!(&encoded[..], &[SOP, 0x02, 0x03, 0x3A, 0x58, 1, 2, 3]);
    }

    #[test]
    fn test_packet_empty() {
        let packet: Packet = Packet::empty(0x20);
        assert!(packet.is_empty());
        assert!(packet.is_valid());
        assert_eq!(packet.header().crc, 0xD38B);
    }

    #[test]
    fn test_payload_too_large() {
        let large_payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let result = Packet::<MAX_PAYLOAD_SIZE>::new(0x21, &large_payload);
        assert_eq!(result, Err(SerializeError::PayloadTooLarge));
    }
}
