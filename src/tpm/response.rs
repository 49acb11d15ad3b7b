//! # Response Codec
//!
//! The registry mapping each command code to its response shape: how many
//! handles precede the parameter area, and the parser (if any) for the
//! parameters themselves. Parsers read through the wire cursor positioned
//! by the executor and produce typed responses owning their blobs.

use crate::core::wire::{WireReader, WireWriter};

use super::Error;
use super::attrs::{self, CommandCode};
use super::types::{TPM_CAP_HANDLES, TPM_CAP_TPM_PROPERTIES, TpmlPcrSelection};

/// A parsed response: any handles, plus the typed parameter body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TpmResponse {
    /// Handles returned ahead of the parameter area.
    pub handles: Vec<u32>,

    /// The decoded parameter area.
    pub body: ResponseBody,
}

/// Typed response parameters, one variant per parsed command.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResponseBody {
    /// The command has no response parameters (Startup, FlushContext).
    None,

    /// `TPM2_GetRandom` parameters.
    GetRandom(GetRandomResponse),

    /// `TPM2_GetCapability` parameters.
    GetCapability(GetCapabilityResponse),

    /// `TPM2_PCR_Read` parameters.
    PcrRead(PcrReadResponse),

    /// `TPM2_StartAuthSession` parameters.
    StartAuthSession(StartAuthSessionResponse),

    /// `TPM2_CreatePrimary` parameters.
    CreatePrimary(CreatePrimaryResponse),

    /// `TPM2_ReadPublic` parameters.
    ReadPublic(ReadPublicResponse),
}

/// `TPM2_GetRandom` response parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetRandomResponse {
    /// The random bytes (a `TPM2B_DIGEST` on the wire).
    pub random_bytes: Vec<u8>,
}

/// Capability data, decoded for the groups the codec understands.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CapabilityData {
    /// `TPM_CAP_HANDLES`: a list of loaded handles.
    Handles(Vec<u32>),

    /// `TPM_CAP_TPM_PROPERTIES`: tagged property values.
    TpmProperties(Vec<(u32, u32)>),

    /// Any other group, kept raw.
    Other {
        /// The capability group.
        capability: u32,
        /// The undecoded union contents.
        data: Vec<u8>,
    },
}

/// `TPM2_GetCapability` response parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetCapabilityResponse {
    /// Whether further properties exist beyond those returned.
    pub more_data: bool,

    /// The returned capability data.
    pub capability_data: CapabilityData,
}

/// `TPM2_PCR_Read` response parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcrReadResponse {
    /// The PCR update counter at read time.
    pub pcr_update_counter: u32,

    /// The selection actually read (may be narrower than requested).
    pub pcr_selection: TpmlPcrSelection,

    /// The digests, in selection order.
    pub pcr_values: Vec<Vec<u8>>,
}

/// `TPM2_StartAuthSession` response parameters. The session handle arrives
/// in the handle area, not here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartAuthSessionResponse {
    /// The TPM's initial nonce.
    pub nonce_tpm: Vec<u8>,
}

/// `TPM2_CreatePrimary` response parameters. The object handle arrives in
/// the handle area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatePrimaryResponse {
    /// The created object's public area (`TPM2B_PUBLIC` contents).
    pub public_area: Vec<u8>,

    /// The creation data (`TPM2B_CREATION_DATA` contents).
    pub creation_data: Vec<u8>,

    /// Hash of the creation data.
    pub creation_hash: Vec<u8>,

    /// The creation ticket (`TPMT_TK_CREATION`, kept raw).
    pub creation_ticket: Vec<u8>,

    /// The created object's name.
    pub name: Vec<u8>,
}

/// `TPM2_ReadPublic` response parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadPublicResponse {
    /// The object's public area (`TPM2B_PUBLIC` contents).
    pub public_area: Vec<u8>,

    /// The object's name.
    pub name: Vec<u8>,

    /// The object's qualified name.
    pub qualified_name: Vec<u8>,
}

/// How to decode one command's response.
pub struct ResponseSpec {
    /// Number of handles preceding the parameter area.
    pub response_handles: usize,

    /// Parser for the parameter area; `None` when the command returns no
    /// parameters.
    pub parser: Option<fn(&mut WireReader<'_>) -> Result<ResponseBody, Error>>,
}

/// The response shape for `code`, derived from the `TPMA_CC` table plus the
/// per-command parser registry.
#[must_use]
pub fn response_spec(code: CommandCode) -> ResponseSpec {
    let response_handles = usize::from(attrs::attributes(code).has_response_handle());
    let parser: Option<fn(&mut WireReader<'_>) -> Result<ResponseBody, Error>> = match code {
        CommandCode::Startup | CommandCode::FlushContext => None,
        CommandCode::GetRandom => Some(parse_get_random as _),
        CommandCode::GetCapability => Some(parse_get_capability as _),
        CommandCode::PcrRead => Some(parse_pcr_read as _),
        CommandCode::StartAuthSession => Some(parse_start_auth_session as _),
        CommandCode::CreatePrimary => Some(parse_create_primary as _),
        CommandCode::ReadPublic => Some(parse_read_public as _),
    };
    ResponseSpec { response_handles, parser }
}

fn parse_get_random(reader: &mut WireReader<'_>) -> Result<ResponseBody, Error> {
    let random_bytes = reader.read_sized()?.to_vec();
    Ok(ResponseBody::GetRandom(GetRandomResponse { random_bytes }))
}

fn parse_get_capability(reader: &mut WireReader<'_>) -> Result<ResponseBody, Error> {
    let more_data = reader.read_u8()? != 0;
    let capability = reader.read_u32()?;

    let capability_data = match capability {
        TPM_CAP_HANDLES => {
            let count = reader.read_u32()?;
            let mut handles = Vec::new();
            for _ in 0..count {
                handles.push(reader.read_u32()?);
            }
            CapabilityData::Handles(handles)
        }
        TPM_CAP_TPM_PROPERTIES => {
            let count = reader.read_u32()?;
            let mut properties = Vec::new();
            for _ in 0..count {
                properties.push((reader.read_u32()?, reader.read_u32()?));
            }
            CapabilityData::TpmProperties(properties)
        }
        _ => CapabilityData::Other { capability, data: reader.read_rest().to_vec() },
    };

    Ok(ResponseBody::GetCapability(GetCapabilityResponse { more_data, capability_data }))
}

fn parse_pcr_read(reader: &mut WireReader<'_>) -> Result<ResponseBody, Error> {
    let pcr_update_counter = reader.read_u32()?;
    let pcr_selection = TpmlPcrSelection::read(reader)?;

    // TPML_DIGEST: count, then TPM2B digests
    let count = reader.read_u32()?;
    let mut pcr_values = Vec::new();
    for _ in 0..count {
        pcr_values.push(reader.read_sized()?.to_vec());
    }

    Ok(ResponseBody::PcrRead(PcrReadResponse { pcr_update_counter, pcr_selection, pcr_values }))
}

fn parse_start_auth_session(reader: &mut WireReader<'_>) -> Result<ResponseBody, Error> {
    let nonce_tpm = reader.read_sized()?.to_vec();
    Ok(ResponseBody::StartAuthSession(StartAuthSessionResponse { nonce_tpm }))
}

fn parse_create_primary(reader: &mut WireReader<'_>) -> Result<ResponseBody, Error> {
    let public_area = reader.read_sized()?.to_vec();
    let creation_data = reader.read_sized()?.to_vec();
    let creation_hash = reader.read_sized()?.to_vec();

    // TPMT_TK_CREATION: tag, hierarchy, TPM2B digest — kept raw
    let tag = reader.read_u16()?;
    let hierarchy = reader.read_u32()?;
    let digest = reader.read_sized()?;
    let mut ticket = WireWriter::with_capacity(8 + digest.len());
    ticket.write_u16(tag);
    ticket.write_u32(hierarchy);
    ticket.write_sized(digest);

    let name = reader.read_sized()?.to_vec();
    Ok(ResponseBody::CreatePrimary(CreatePrimaryResponse {
        public_area,
        creation_data,
        creation_hash,
        creation_ticket: ticket.into_bytes(),
        name,
    }))
}

fn parse_read_public(reader: &mut WireReader<'_>) -> Result<ResponseBody, Error> {
    let public_area = reader.read_sized()?.to_vec();
    let name = reader.read_sized()?.to_vec();
    let qualified_name = reader.read_sized()?.to_vec();
    Ok(ResponseBody::ReadPublic(ReadPublicResponse { public_area, name, qualified_name }))
}
