//! # Command Inputs
//!
//! One input type per supported command. Each knows its command code,
//! writes its own handle and parameter areas through the wire cursor, and
//! reports its serialized size (handles plus parameters, header excluded)
//! so the executor can size buffers without a trial encode.

use zeroize::Zeroizing;

use crate::core::wire::WireWriter;

use super::attrs::CommandCode;
use super::types::{SymDef, TpmlPcrSelection};

/// A TPM command ready for encoding.
pub trait CommandInput {
    /// The command's code.
    fn command_code(&self) -> CommandCode;

    /// Append the handle area. Commands without handles write nothing.
    fn write_handles(&self, writer: &mut WireWriter) {
        let _ = writer;
    }

    /// Append the parameter area.
    fn write_parameters(&self, writer: &mut WireWriter);

    /// Encoded size of handles plus parameters, excluding the header and
    /// any authorization area.
    fn serialized_size(&self) -> usize;
}

/// `TPM2_Startup`.
#[derive(Clone, Copy, Debug)]
pub struct StartupInput {
    /// `TPM_SU_CLEAR` or `TPM_SU_STATE`.
    pub startup_type: u16,
}

impl CommandInput for StartupInput {
    fn command_code(&self) -> CommandCode {
        CommandCode::Startup
    }

    fn write_parameters(&self, writer: &mut WireWriter) {
        writer.write_u16(self.startup_type);
    }

    fn serialized_size(&self) -> usize {
        2
    }
}

/// `TPM2_GetRandom`.
#[derive(Clone, Copy, Debug)]
pub struct GetRandomInput {
    /// Number of random bytes requested.
    pub bytes_requested: u16,
}

impl CommandInput for GetRandomInput {
    fn command_code(&self) -> CommandCode {
        CommandCode::GetRandom
    }

    fn write_parameters(&self, writer: &mut WireWriter) {
        writer.write_u16(self.bytes_requested);
    }

    fn serialized_size(&self) -> usize {
        2
    }
}

/// `TPM2_GetCapability`.
#[derive(Clone, Copy, Debug)]
pub struct GetCapabilityInput {
    /// The capability group (`TPM_CAP_*`).
    pub capability: u32,

    /// First property in the group to return.
    pub property: u32,

    /// Maximum number of properties to return.
    pub property_count: u32,
}

impl CommandInput for GetCapabilityInput {
    fn command_code(&self) -> CommandCode {
        CommandCode::GetCapability
    }

    fn write_parameters(&self, writer: &mut WireWriter) {
        writer.write_u32(self.capability);
        writer.write_u32(self.property);
        writer.write_u32(self.property_count);
    }

    fn serialized_size(&self) -> usize {
        12
    }
}

/// `TPM2_PCR_Read`.
#[derive(Clone, Debug)]
pub struct PcrReadInput {
    /// Which PCRs to read, per hash bank.
    pub selection: TpmlPcrSelection,
}

impl CommandInput for PcrReadInput {
    fn command_code(&self) -> CommandCode {
        CommandCode::PcrRead
    }

    fn write_parameters(&self, writer: &mut WireWriter) {
        self.selection.write(writer);
    }

    fn serialized_size(&self) -> usize {
        self.selection.serialized_size()
    }
}

/// `TPM2_StartAuthSession`.
#[derive(Clone, Debug)]
pub struct StartAuthSessionInput {
    /// Handle of the key used to encrypt the salt (`TPM_RH_NULL` for an
    /// unsalted session).
    pub tpm_key: u32,

    /// Handle of the bind entity (`TPM_RH_NULL` for unbound).
    pub bind: u32,

    /// The caller's initial nonce.
    pub nonce_caller: Vec<u8>,

    /// The salt, encrypted to `tpm_key`; empty when unsalted.
    pub encrypted_salt: Vec<u8>,

    /// `TPM_SE_HMAC`, `TPM_SE_POLICY`, or `TPM_SE_TRIAL`.
    pub session_type: u8,

    /// Parameter-encryption algorithm for the session.
    pub symmetric: SymDef,

    /// The session's hash algorithm (`TPM_ALG_SHA256`).
    pub auth_hash: u16,
}

impl CommandInput for StartAuthSessionInput {
    fn command_code(&self) -> CommandCode {
        CommandCode::StartAuthSession
    }

    fn write_handles(&self, writer: &mut WireWriter) {
        writer.write_u32(self.tpm_key);
        writer.write_u32(self.bind);
    }

    fn write_parameters(&self, writer: &mut WireWriter) {
        writer.write_sized(&self.nonce_caller);
        writer.write_sized(&self.encrypted_salt);
        writer.write_u8(self.session_type);
        self.symmetric.write(writer);
        writer.write_u16(self.auth_hash);
    }

    fn serialized_size(&self) -> usize {
        8 + (2 + self.nonce_caller.len())
            + (2 + self.encrypted_salt.len())
            + 1
            + self.symmetric.serialized_size()
            + 2
    }
}

/// `TPM2_CreatePrimary`.
///
/// The sensitive-create blob holds the authorization value and seed; it is
/// zeroized when the input is dropped.
#[derive(Clone, Debug)]
pub struct CreatePrimaryInput {
    /// The hierarchy to create under (`TPM_RH_OWNER`, ...).
    pub primary_handle: u32,

    /// Encoded `TPMS_SENSITIVE_CREATE` contents (without the outer `TPM2B`
    /// prefix, which the codec adds).
    pub sensitive_create: Zeroizing<Vec<u8>>,

    /// Encoded `TPMT_PUBLIC` template (without the outer `TPM2B` prefix).
    pub public_template: Vec<u8>,

    /// Caller data to be reflected in the creation data.
    pub outside_info: Vec<u8>,

    /// PCRs to bind into the creation data.
    pub creation_pcr: TpmlPcrSelection,
}

impl CommandInput for CreatePrimaryInput {
    fn command_code(&self) -> CommandCode {
        CommandCode::CreatePrimary
    }

    fn write_handles(&self, writer: &mut WireWriter) {
        writer.write_u32(self.primary_handle);
    }

    fn write_parameters(&self, writer: &mut WireWriter) {
        writer.write_sized(&self.sensitive_create);
        writer.write_sized(&self.public_template);
        writer.write_sized(&self.outside_info);
        self.creation_pcr.write(writer);
    }

    fn serialized_size(&self) -> usize {
        4 + (2 + self.sensitive_create.len())
            + (2 + self.public_template.len())
            + (2 + self.outside_info.len())
            + self.creation_pcr.serialized_size()
    }
}

/// `TPM2_ReadPublic`.
#[derive(Clone, Copy, Debug)]
pub struct ReadPublicInput {
    /// The object whose public area is requested.
    pub object_handle: u32,
}

impl CommandInput for ReadPublicInput {
    fn command_code(&self) -> CommandCode {
        CommandCode::ReadPublic
    }

    fn write_handles(&self, writer: &mut WireWriter) {
        writer.write_u32(self.object_handle);
    }

    fn write_parameters(&self, _writer: &mut WireWriter) {}

    fn serialized_size(&self) -> usize {
        4
    }
}

/// `TPM2_FlushContext`.
///
/// The flush target travels in the parameter area, not the handle area.
#[derive(Clone, Copy, Debug)]
pub struct FlushContextInput {
    /// The transient object or session to flush.
    pub flush_handle: u32,
}

impl CommandInput for FlushContextInput {
    fn command_code(&self) -> CommandCode {
        CommandCode::FlushContext
    }

    fn write_parameters(&self, writer: &mut WireWriter) {
        writer.write_u32(self.flush_handle);
    }

    fn serialized_size(&self) -> usize {
        4
    }
}
