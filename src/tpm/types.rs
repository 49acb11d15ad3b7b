//! # TPM Wire Types
//!
//! The fixed 10-byte envelope header, zero-copy blob references, and the
//! handful of TPM structures the supported commands exchange. All integers
//! are big-endian; `TPM2B_*` values are `u16`-length-prefixed.

use crate::core::wire::{WireReader, WireWriter};

use super::Error;

/// `TPM_ST_NO_SESSIONS`: the command carries no authorization area.
pub const TPM_ST_NO_SESSIONS: u16 = 0x8001;
/// `TPM_ST_SESSIONS`: an authorization area follows the handles.
pub const TPM_ST_SESSIONS: u16 = 0x8002;

/// `TPM_SU_CLEAR` startup type.
pub const TPM_SU_CLEAR: u16 = 0x0000;
/// `TPM_SU_STATE` startup type.
pub const TPM_SU_STATE: u16 = 0x0001;

/// `TPM_ALG_AES`.
pub const TPM_ALG_AES: u16 = 0x0006;
/// `TPM_ALG_SHA256`.
pub const TPM_ALG_SHA256: u16 = 0x000B;
/// `TPM_ALG_NULL`.
pub const TPM_ALG_NULL: u16 = 0x0010;
/// `TPM_ALG_CFB` block-cipher mode.
pub const TPM_ALG_CFB: u16 = 0x0043;

/// `TPM_RH_OWNER` hierarchy handle.
pub const TPM_RH_OWNER: u32 = 0x4000_0001;
/// `TPM_RH_ENDORSEMENT` hierarchy handle.
pub const TPM_RH_ENDORSEMENT: u32 = 0x4000_000B;
/// `TPM_RH_NULL` handle.
pub const TPM_RH_NULL: u32 = 0x4000_0007;
/// `TPM_RS_PW`: the password authorization session handle.
pub const TPM_RS_PW: u32 = 0x4000_0009;

/// `TPM_SE_HMAC` session type.
pub const TPM_SE_HMAC: u8 = 0x00;
/// `TPM_SE_POLICY` session type.
pub const TPM_SE_POLICY: u8 = 0x01;
/// `TPM_SE_TRIAL` session type.
pub const TPM_SE_TRIAL: u8 = 0x03;

/// `TPM_CAP_HANDLES` capability group.
pub const TPM_CAP_HANDLES: u32 = 0x0000_0001;
/// `TPM_CAP_TPM_PROPERTIES` capability group.
pub const TPM_CAP_TPM_PROPERTIES: u32 = 0x0000_0006;

/// The fixed 10-byte prefix of every command and response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TpmHeader {
    /// Session tag (`TPM_ST_NO_SESSIONS` / `TPM_ST_SESSIONS`).
    pub tag: u16,

    /// Total envelope size in bytes, header included.
    pub size: u32,

    /// Command code on the way out, response code on the way back.
    pub code: u32,
}

impl TpmHeader {
    /// Encoded header length.
    pub const LEN: usize = 10;

    /// Append the header to `writer`.
    pub fn write(&self, writer: &mut WireWriter) {
        writer.write_u16(self.tag);
        writer.write_u32(self.size);
        writer.write_u32(self.code);
    }

    /// Read a header from `reader`.
    ///
    /// # Errors
    ///
    /// Returns a wire error if fewer than 10 bytes remain.
    pub fn read(reader: &mut WireReader<'_>) -> Result<Self, Error> {
        Ok(Self { tag: reader.read_u16()?, size: reader.read_u32()?, code: reader.read_u32()? })
    }
}

/// A zero-copy `(offset, length)` reference into an external buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TpmBlob {
    /// Byte offset into the buffer.
    pub offset: usize,

    /// Length of the referenced region.
    pub length: usize,
}

impl TpmBlob {
    /// Resolve against `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Envelope`] if the reference overruns the buffer.
    pub fn slice<'a>(&self, buffer: &'a [u8]) -> Result<&'a [u8], Error> {
        buffer.get(self.offset..self.offset + self.length).ok_or_else(|| {
            Error::Envelope(format!(
                "blob ({}, {}) overruns buffer of {} bytes",
                self.offset,
                self.length,
                buffer.len()
            ))
        })
    }
}

/// `TPMT_SYM_DEF`: the symmetric algorithm for session parameter
/// encryption. `TPM_ALG_NULL` encodes as the bare algorithm identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymDef {
    /// No parameter encryption.
    Null,

    /// AES in the given mode.
    Aes {
        /// Key size in bits.
        key_bits: u16,
        /// Block-cipher mode (`TPM_ALG_CFB` for sessions).
        mode: u16,
    },
}

impl SymDef {
    /// Append the wire form.
    pub fn write(&self, writer: &mut WireWriter) {
        match self {
            Self::Null => writer.write_u16(TPM_ALG_NULL),
            Self::Aes { key_bits, mode } => {
                writer.write_u16(TPM_ALG_AES);
                writer.write_u16(*key_bits);
                writer.write_u16(*mode);
            }
        }
    }

    /// Encoded size in bytes.
    #[must_use]
    pub const fn serialized_size(&self) -> usize {
        match self {
            Self::Null => 2,
            Self::Aes { .. } => 6,
        }
    }
}

/// `TPMS_PCR_SELECTION`: one hash bank and its PCR bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TpmsPcrSelection {
    /// The bank's hash algorithm.
    pub hash_alg: u16,

    /// PCR selection bitmap, one bit per PCR, LSB of byte 0 = PCR 0.
    pub pcr_select: Vec<u8>,
}

impl TpmsPcrSelection {
    /// Select `pcrs` in a SHA-256 bank with the standard 3-byte bitmap.
    #[must_use]
    pub fn sha256(pcrs: &[u8]) -> Self {
        let mut select = vec![0_u8; 3];
        for &pcr in pcrs {
            let index = usize::from(pcr / 8);
            if index < select.len() {
                select[index] |= 1 << (pcr % 8);
            }
        }
        Self { hash_alg: TPM_ALG_SHA256, pcr_select: select }
    }

    fn write(&self, writer: &mut WireWriter) {
        writer.write_u16(self.hash_alg);
        writer.write_u8(u8::try_from(self.pcr_select.len()).unwrap_or(u8::MAX));
        writer.write_bytes(&self.pcr_select);
    }

    fn read(reader: &mut WireReader<'_>) -> Result<Self, Error> {
        let hash_alg = reader.read_u16()?;
        let size = reader.read_u8()? as usize;
        let pcr_select = reader.read_bytes(size)?.to_vec();
        Ok(Self { hash_alg, pcr_select })
    }

    const fn serialized_size(&self) -> usize {
        3 + self.pcr_select.len()
    }
}

/// `TPML_PCR_SELECTION`: a counted list of PCR selections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TpmlPcrSelection {
    /// The selections, one per hash bank.
    pub selections: Vec<TpmsPcrSelection>,
}

impl TpmlPcrSelection {
    /// A single-bank selection.
    #[must_use]
    pub fn one(selection: TpmsPcrSelection) -> Self {
        Self { selections: vec![selection] }
    }

    /// Append the wire form.
    pub fn write(&self, writer: &mut WireWriter) {
        writer.write_u32(u32::try_from(self.selections.len()).unwrap_or(u32::MAX));
        for selection in &self.selections {
            selection.write(writer);
        }
    }

    /// Read the wire form.
    ///
    /// # Errors
    ///
    /// Returns a wire error on truncation.
    pub fn read(reader: &mut WireReader<'_>) -> Result<Self, Error> {
        let count = reader.read_u32()?;
        let mut selections = Vec::new();
        for _ in 0..count {
            selections.push(TpmsPcrSelection::read(reader)?);
        }
        Ok(Self { selections })
    }

    /// Encoded size in bytes.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        4 + self.selections.iter().map(TpmsPcrSelection::serialized_size).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = TpmHeader { tag: TPM_ST_NO_SESSIONS, size: 12, code: 0x0000_017B };
        let mut writer = WireWriter::new();
        header.write(&mut writer);

        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), TpmHeader::LEN);
        assert_eq!(bytes, vec![0x80, 0x01, 0x00, 0x00, 0x00, 0x0C, 0x00, 0x00, 0x01, 0x7B]);

        let mut reader = WireReader::new(&bytes);
        assert_eq!(TpmHeader::read(&mut reader).expect("should read"), header);
    }

    #[test]
    fn blob_bounds() {
        let buffer = [1_u8, 2, 3, 4];
        let blob = TpmBlob { offset: 1, length: 2 };
        assert_eq!(blob.slice(&buffer).expect("should slice"), &[2, 3]);

        let overrun = TpmBlob { offset: 3, length: 2 };
        assert!(matches!(overrun.slice(&buffer), Err(Error::Envelope(_))));
    }

    #[test]
    fn pcr_selection_bitmap() {
        let selection = TpmsPcrSelection::sha256(&[0, 7, 8]);
        assert_eq!(selection.pcr_select, vec![0x81, 0x01, 0x00]);
    }

    #[test]
    fn pcr_list_round_trip() {
        let list = TpmlPcrSelection::one(TpmsPcrSelection::sha256(&[4]));
        let mut writer = WireWriter::new();
        list.write(&mut writer);
        assert_eq!(writer.len(), list.serialized_size());

        let bytes = writer.into_bytes();
        let mut reader = WireReader::new(&bytes);
        assert_eq!(TpmlPcrSelection::read(&mut reader).expect("should read"), list);
    }

    #[test]
    fn null_symmetric_is_bare_algorithm() {
        let mut writer = WireWriter::new();
        SymDef::Null.write(&mut writer);
        assert_eq!(writer.into_bytes(), vec![0x00, 0x10]);
    }
}
