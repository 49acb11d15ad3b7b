//! TPM envelope round-trips against an in-memory transport.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use verifiable_core::core::wire::{WireReader, WireWriter};
use verifiable_core::sensitive::{SensitivePool, Tag};
use verifiable_core::tpm::{
    CapabilityData, Error, GetCapabilityInput, GetRandomInput, HmacSession, PcrReadInput,
    ReadPublicInput, ResponseBody, TpmExecutor, TpmTransport, TpmlPcrSelection, TpmsPcrSelection,
};

type HmacSha256 = Hmac<Sha256>;

/// Plays back one canned response, optionally asserting the exact command
/// bytes first.
struct Canned {
    expect: Option<Vec<u8>>,
    reply: Vec<u8>,
}

impl TpmTransport for Canned {
    fn exchange(&mut self, command: &[u8]) -> Result<Vec<u8>, Error> {
        if let Some(expect) = &self.expect {
            assert_eq!(hex::encode(command), hex::encode(expect));
        }
        Ok(self.reply.clone())
    }
}

#[test]
fn get_random_wire_vectors() {
    // TPM_ST_NO_SESSIONS, size 12, TPM_CC_GetRandom, bytesRequested 16
    let command = hex::decode("80010000000c0000017b0010").expect("valid hex");
    // TPM_ST_NO_SESSIONS, size 28, TPM_RC_SUCCESS, TPM2B_DIGEST of 16 bytes
    let reply =
        hex::decode("80010000001c00000000001000112233445566778899aabbccddeeff").expect("valid hex");

    let mut executor = TpmExecutor::new(Canned { expect: Some(command), reply });
    let response =
        executor.execute(&GetRandomInput { bytes_requested: 16 }).expect("should execute");

    let ResponseBody::GetRandom(body) = response.body else { panic!("wrong body") };
    assert_eq!(body.random_bytes.len(), 16);
    assert_eq!(body.random_bytes[0], 0x00);
    assert_eq!(body.random_bytes[15], 0xFF);
}

#[test]
fn pcr_read_response_parses_all_three_lists() {
    // build the response: update counter, TPML_PCR_SELECTION, TPML_DIGEST
    let mut writer = WireWriter::new();
    writer.write_u16(0x8001);
    writer.write_u32(0); // size placeholder
    writer.write_u32(0); // TPM_RC_SUCCESS
    writer.write_u32(42); // pcrUpdateCounter
    TpmlPcrSelection::one(TpmsPcrSelection::sha256(&[0])).write(&mut writer);
    writer.write_u32(1); // one digest
    writer.write_sized(&[0xD1; 32]);
    let total = u32::try_from(writer.len()).expect("fits");
    writer.patch_u32(2, total);

    let mut executor = TpmExecutor::new(Canned { expect: None, reply: writer.into_bytes() });
    let selection = TpmlPcrSelection::one(TpmsPcrSelection::sha256(&[0]));
    let response = executor.execute(&PcrReadInput { selection }).expect("should execute");

    let ResponseBody::PcrRead(body) = response.body else { panic!("wrong body") };
    assert_eq!(body.pcr_update_counter, 42);
    assert_eq!(body.pcr_selection.selections.len(), 1);
    assert_eq!(body.pcr_values, vec![vec![0xD1; 32]]);
}

#[test]
fn get_capability_properties() {
    let mut writer = WireWriter::new();
    writer.write_u16(0x8001);
    writer.write_u32(0);
    writer.write_u32(0);
    writer.write_u8(0); // no more data
    writer.write_u32(0x0000_0006); // TPM_CAP_TPM_PROPERTIES
    writer.write_u32(1);
    writer.write_u32(0x0000_0100); // TPM_PT_FAMILY_INDICATOR
    writer.write_u32(0x322E_3000); // "2.0"
    let total = u32::try_from(writer.len()).expect("fits");
    writer.patch_u32(2, total);

    let mut executor = TpmExecutor::new(Canned { expect: None, reply: writer.into_bytes() });
    let response = executor
        .execute(&GetCapabilityInput { capability: 6, property: 0x100, property_count: 1 })
        .expect("should execute");

    let ResponseBody::GetCapability(body) = response.body else { panic!("wrong body") };
    assert!(!body.more_data);
    assert_eq!(
        body.capability_data,
        CapabilityData::TpmProperties(vec![(0x100, 0x322E_3000)])
    );
}

#[test]
fn read_public_splits_three_blobs() {
    let mut writer = WireWriter::new();
    writer.write_u16(0x8001);
    writer.write_u32(0);
    writer.write_u32(0);
    writer.write_sized(&[0xAA; 12]); // public area
    writer.write_sized(&[0xBB; 34]); // name
    writer.write_sized(&[0xCC; 34]); // qualified name
    let total = u32::try_from(writer.len()).expect("fits");
    writer.patch_u32(2, total);

    let mut executor = TpmExecutor::new(Canned { expect: None, reply: writer.into_bytes() });
    let response = executor
        .execute(&ReadPublicInput { object_handle: 0x8000_0000 })
        .expect("should execute");

    let ResponseBody::ReadPublic(body) = response.body else { panic!("wrong body") };
    assert_eq!(body.public_area, vec![0xAA; 12]);
    assert_eq!(body.name.len(), 34);
    assert_eq!(body.qualified_name.len(), 34);
}

/// A transport that answers `GetRandom` with a properly HMAC-authorized
/// session response, sharing the session key with the test.
struct SessionTransport {
    key: Vec<u8>,
    nonce_caller: Vec<u8>,
    nonce_tpm_next: Vec<u8>,
    attributes: u8,
    corrupt_mac: bool,
}

impl TpmTransport for SessionTransport {
    fn exchange(&mut self, command: &[u8]) -> Result<Vec<u8>, Error> {
        // command must announce sessions
        assert_eq!(&command[..2], &[0x80, 0x02]);

        // parameters: TPM2B_DIGEST with 8 bytes
        let mut parameters = WireWriter::new();
        parameters.write_sized(&[0xC4; 8]);
        let parameters = parameters.into_bytes();

        let rp_hash = Sha256::new()
            .chain_update(0_u32.to_be_bytes())
            .chain_update(0x0000_017B_u32.to_be_bytes())
            .chain_update(&parameters)
            .finalize();
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("any length");
        mac.update(&rp_hash);
        mac.update(&self.nonce_tpm_next);
        mac.update(&self.nonce_caller);
        mac.update(&[self.attributes]);
        let mut mac = mac.finalize().into_bytes().to_vec();
        if self.corrupt_mac {
            mac[0] ^= 0xFF;
        }

        let mut writer = WireWriter::new();
        writer.write_u16(0x8002);
        writer.write_u32(0);
        writer.write_u32(0);
        writer.write_u32(u32::try_from(parameters.len()).expect("fits"));
        writer.write_bytes(&parameters);
        writer.write_sized(&self.nonce_tpm_next);
        writer.write_u8(self.attributes);
        writer.write_sized(&mac);
        let total = u32::try_from(writer.len()).expect("fits");
        writer.patch_u32(2, total);
        Ok(writer.into_bytes())
    }
}

fn session_fixture(pool: &SensitivePool, corrupt_mac: bool) -> (TpmExecutor<SessionTransport>, Vec<u8>) {
    let key = vec![0x11_u8; 32];
    let nonce_caller = vec![0xA5_u8; 16];
    let nonce_tpm = vec![0x5A_u8; 16];
    let nonce_tpm_next = vec![0x33_u8; 16];

    let session_key = pool.from_slice(Tag::TpmSessionKey, &key).expect("should rent");
    let session = HmacSession::new(0x0200_0000, nonce_caller.clone(), nonce_tpm, 0x01, session_key);

    let transport = SessionTransport {
        key,
        nonce_caller,
        nonce_tpm_next: nonce_tpm_next.clone(),
        attributes: 0x01,
        corrupt_mac,
    };
    let mut executor = TpmExecutor::new(transport);
    executor.bind_session(session);
    (executor, nonce_tpm_next)
}

#[test]
fn hmac_session_round_trip_rolls_nonces() {
    let pool = SensitivePool::new();
    let (mut executor, nonce_tpm_next) = session_fixture(&pool, false);

    let response =
        executor.execute(&GetRandomInput { bytes_requested: 8 }).expect("should execute");
    let ResponseBody::GetRandom(body) = response.body else { panic!("wrong body") };
    assert_eq!(body.random_bytes, vec![0xC4; 8]);

    let session = executor.take_session().expect("session bound");
    assert_eq!(session.nonce_tpm, nonce_tpm_next);
}

#[test]
fn corrupted_response_hmac_is_fatal() {
    let pool = SensitivePool::new();
    let (mut executor, _) = session_fixture(&pool, true);

    let err =
        executor.execute(&GetRandomInput { bytes_requested: 8 }).expect_err("should fail");
    assert!(matches!(err, Error::Envelope(_)));
}

#[test]
fn response_envelope_arithmetic() {
    // for a no-session response: size == 10 + handles + parameters
    let mut writer = WireWriter::new();
    writer.write_u16(0x8001);
    writer.write_u32(0);
    writer.write_u32(0);
    writer.write_sized(&[0x01; 4]);
    let total = u32::try_from(writer.len()).expect("fits");
    writer.patch_u32(2, total);
    let reply = writer.into_bytes();

    let mut reader = WireReader::new(&reply);
    let _tag = reader.read_u16().expect("tag");
    let size = reader.read_u32().expect("size");
    assert_eq!(size as usize, 10 + 0 + (2 + 4));
}
