//! # Command Executor
//!
//! Assembles `Header | Handles | AuthArea? | Parameters`, patches the header
//! size, runs the command over the transport, and splits the response by the
//! per-command metadata in the attributes table. HMAC-bound sessions get
//! `cpHash`/`rpHash` integrity per TPM 2.0 Part 1: the command HMAC covers
//! `cpHash ‖ nonceCaller ‖ nonceTPM ‖ sessionAttributes`, the response HMAC
//! the mirrored `rpHash` form.
//!
//! One executor serializes access to one TPM: `execute` takes `&mut self`,
//! so at most one command is in flight per instance.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::core::wire::{WireReader, WireWriter};
use crate::sensitive::SecretBuffer;

use super::attrs::{self, CommandCode};
use super::command::CommandInput;
use super::response::{ResponseBody, TpmResponse, response_spec};
use super::types::{TPM_ST_NO_SESSIONS, TPM_ST_SESSIONS, TpmBlob, TpmHeader};
use super::Error;

type HmacSha256 = Hmac<Sha256>;

/// A byte channel to a TPM device or simulator.
///
/// Implementations live outside this crate (character device, simulator
/// socket); the codec only needs request/response framing.
pub trait TpmTransport {
    /// Send one command envelope and return the complete response envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the channel fails.
    fn exchange(&mut self, command: &[u8]) -> Result<Vec<u8>, Error>;
}

/// An HMAC authorization session bound to an executor.
///
/// The session key lives in a [`SecretBuffer`] and is only read while
/// computing authorization MACs. Nonces roll on every exchange: the TPM's
/// response nonce becomes the session's `nonce_tpm` for the next command.
#[derive(Debug)]
pub struct HmacSession {
    /// The session handle returned by `StartAuthSession`.
    pub handle: u32,

    /// The caller's current nonce.
    pub nonce_caller: Vec<u8>,

    /// The TPM's current nonce.
    pub nonce_tpm: Vec<u8>,

    /// `TPMA_SESSION` attribute byte (`continueSession` is bit 0).
    pub attributes: u8,

    session_key: SecretBuffer,
}

impl HmacSession {
    /// Bind a session from the `StartAuthSession` exchange.
    #[must_use]
    pub fn new(
        handle: u32, nonce_caller: Vec<u8>, nonce_tpm: Vec<u8>, attributes: u8,
        session_key: SecretBuffer,
    ) -> Self {
        Self { handle, nonce_caller, nonce_tpm, attributes, session_key }
    }

    /// `TPMS_AUTH_COMMAND` for a command with the given `cpHash`.
    fn authorize_command(&self, cp_hash: &[u8]) -> Vec<u8> {
        let mac = self.session_key.expose(|key| {
            let mut mac = HmacSha256::new_from_slice(key).expect("any key length is valid");
            mac.update(cp_hash);
            mac.update(&self.nonce_caller);
            mac.update(&self.nonce_tpm);
            mac.update(&[self.attributes]);
            mac.finalize().into_bytes()
        });

        let mut auth = WireWriter::with_capacity(4 + 2 + self.nonce_caller.len() + 1 + 2 + 32);
        auth.write_u32(self.handle);
        auth.write_sized(&self.nonce_caller);
        auth.write_u8(self.attributes);
        auth.write_sized(&mac);
        auth.into_bytes()
    }

    /// Check a response HMAC against the given `rpHash`.
    fn verify_response(&self, rp_hash: &[u8], nonce_tpm: &[u8], attributes: u8, mac: &[u8]) -> bool {
        self.session_key.expose(|key| {
            let mut expected = HmacSha256::new_from_slice(key).expect("any key length is valid");
            expected.update(rp_hash);
            expected.update(nonce_tpm);
            expected.update(&self.nonce_caller);
            expected.update(&[attributes]);
            expected.verify_slice(mac).is_ok()
        })
    }
}

/// Drives commands over one transport, one at a time.
pub struct TpmExecutor<T: TpmTransport> {
    transport: T,
    session: Option<HmacSession>,
}

impl<T: TpmTransport> TpmExecutor<T> {
    /// Create an executor over `transport`.
    pub const fn new(transport: T) -> Self {
        Self { transport, session: None }
    }

    /// Bind an HMAC session; subsequent commands carry an authorization
    /// area and are integrity-checked.
    pub fn bind_session(&mut self, session: HmacSession) {
        self.session = Some(session);
    }

    /// Drop the bound session, returning it to the caller (for flushing).
    pub fn take_session(&mut self) -> Option<HmacSession> {
        self.session.take()
    }

    /// Execute one command and parse its response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Response`] for any non-zero TPM response code,
    /// [`Error::Envelope`] for inconsistent envelopes or a failed response
    /// HMAC, and [`Error::Transport`] when the byte channel fails.
    pub fn execute(&mut self, input: &impl CommandInput) -> Result<TpmResponse, Error> {
        let code = input.command_code();
        let attributes = attrs::attributes(code);
        let tag = if self.session.is_some() { TPM_ST_SESSIONS } else { TPM_ST_NO_SESSIONS };

        // header placeholder, patched once the full size is known
        let mut writer = WireWriter::with_capacity(TpmHeader::LEN + input.serialized_size() + 64);
        TpmHeader { tag, size: 0, code: code.value() }.write(&mut writer);

        let handles_start = writer.len();
        input.write_handles(&mut writer);
        let handle_bytes = writer.len() - handles_start;
        if handle_bytes != attributes.command_handles() * 4 {
            return Err(Error::Envelope(format!(
                "{code:?} wrote {handle_bytes} handle bytes, expected {}",
                attributes.command_handles() * 4
            )));
        }

        // parameters are staged separately: cpHash needs them, and the
        // authorization area precedes them on the wire
        let mut parameters = WireWriter::new();
        input.write_parameters(&mut parameters);
        let parameters = parameters.into_bytes();

        if let Some(session) = &self.session {
            let cp_hash = Sha256::new()
                .chain_update(code.value().to_be_bytes())
                .chain_update(&writer.as_slice()[handles_start..])
                .chain_update(&parameters)
                .finalize();
            let auth = session.authorize_command(&cp_hash);
            writer.write_u32(u32::try_from(auth.len()).unwrap_or(u32::MAX));
            writer.write_bytes(&auth);
        }

        writer.write_bytes(&parameters);
        let total = u32::try_from(writer.len())
            .map_err(|_| Error::Envelope("command exceeds u32 size".to_string()))?;
        writer.patch_u32(2, total);

        let command = writer.into_bytes();
        tracing::debug!(?code, size = command.len(), sessions = self.session.is_some(), "executing");
        let response = self.transport.exchange(&command)?;

        self.parse_response(code, &response)
    }

    fn parse_response(&mut self, code: CommandCode, response: &[u8]) -> Result<TpmResponse, Error> {
        let mut reader = WireReader::new(response);
        let header = TpmHeader::read(&mut reader)?;

        if header.size as usize != response.len() {
            return Err(Error::Envelope(format!(
                "header size {} does not match buffer length {}",
                header.size,
                response.len()
            )));
        }
        if header.code != 0 {
            return Err(Error::Response(header.code));
        }

        let expected_tag = if self.session.is_some() { TPM_ST_SESSIONS } else { TPM_ST_NO_SESSIONS };
        if header.tag != expected_tag {
            return Err(Error::Envelope(format!(
                "response tag {:#06x}, expected {expected_tag:#06x}",
                header.tag
            )));
        }

        let spec = response_spec(code);
        let mut handles = Vec::with_capacity(spec.response_handles);
        for _ in 0..spec.response_handles {
            handles.push(reader.read_u32()?);
        }

        // with sessions the parameter area is length-prefixed and followed
        // by the response authorization area
        let parameter_area = if let Some(session) = self.session.as_mut() {
            let parameter_size = reader.read_u32()? as usize;
            let blob = TpmBlob { offset: reader.position(), length: parameter_size };
            reader.read_bytes(parameter_size)?;

            let nonce_tpm = reader.read_sized()?.to_vec();
            let auth_attributes = reader.read_u8()?;
            let mac = reader.read_sized()?;

            let rp_hash = Sha256::new()
                .chain_update(0_u32.to_be_bytes())
                .chain_update(code.value().to_be_bytes())
                .chain_update(blob.slice(response)?)
                .finalize();
            if !session.verify_response(&rp_hash, &nonce_tpm, auth_attributes, mac) {
                return Err(Error::Envelope("response HMAC does not verify".to_string()));
            }
            session.nonce_tpm = nonce_tpm;
            blob
        } else {
            TpmBlob { offset: reader.position(), length: reader.remaining() }
        };

        let body = match spec.parser {
            None => ResponseBody::None,
            Some(parse) => {
                let mut parameters = WireReader::new(parameter_area.slice(response)?);
                let body = parse(&mut parameters)?;
                if !parameters.is_exhausted() {
                    return Err(Error::Envelope(format!(
                        "{} unparsed parameter bytes",
                        parameters.remaining()
                    )));
                }
                body
            }
        };

        Ok(TpmResponse { handles, body })
    }
}
