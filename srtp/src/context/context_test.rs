use super::*;

const CIPHER_CONTEXT_ALGO: ProtectionProfile = ProtectionProfile::Aes128CmHmacSha1_80;
const DEFAULT_SSRC: u32 = 0;

#[test]
fn test_context_key_len() -> Result<()> {
    let key_len = CIPHER_CONTEXT_ALGO.key_len();
    let salt_len = CIPHER_CONTEXT_ALGO.salt_len();

    let result = Context::new(&[], &vec![0; salt_len], CIPHER_CONTEXT_ALGO, None, None);
    assert!(result.is_err(), "CreateContext accepted a 0 length key");

    let result = Context::new(&vec![0; key_len], &[], CIPHER_CONTEXT_ALGO, None, None);
    assert!(result.is_err(), "CreateContext accepted a 0 length salt");

    let result = Context::new(
        &vec![0; key_len],
        &vec![0; salt_len],
        CIPHER_CONTEXT_ALGO,
        None,
        None,
    );
    assert!(
        result.is_ok(),
        "CreateContext failed with a valid length key and salt"
    );

    Ok(())
}

#[test]
fn test_context_key_len_per_profile() {
    for profile in [
        ProtectionProfile::Aes128CmHmacSha1_32,
        ProtectionProfile::AeadAes128Gcm,
        ProtectionProfile::AeadAes256Gcm,
    ] {
        let result = Context::new(
            &vec![0; profile.key_len()],
            &vec![0; profile.salt_len()],
            profile,
            None,
            None,
        );
        assert!(result.is_ok(), "{profile:?} rejected a valid key and salt");

        let short = Context::new(
            &vec![0; profile.key_len() - 1],
            &vec![0; profile.salt_len()],
            profile,
            None,
            None,
        );
        assert_eq!(
            short.err(),
            Some(Error::SrtpMasterKeyLength(
                profile.key_len(),
                profile.key_len() - 1
            ))
        );
    }
}

#[test]
fn test_rollover_count() -> Result<()> {
    let mut s = SrtpSsrcState {
        ssrc: DEFAULT_SSRC,
        ..Default::default()
    };

    // Set initial seqnum
    s.update_rollover_count(65530)?;

    // We rolled over to 0
    s.update_rollover_count(0)?;
    assert_eq!(
        s.rollover_counter, 1,
        "rolloverCounter was not updated after it crossed 0"
    );

    s.update_rollover_count(65530)?;
    assert_eq!(
        s.rollover_counter, 0,
        "rolloverCounter was not updated when it rolled back, failed to handle out of order"
    );

    s.update_rollover_count(5)?;
    assert_eq!(
        s.rollover_counter, 1,
        "rolloverCounter was not updated when it rolled over initial, to handle out of order"
    );

    s.update_rollover_count(6)?;
    s.update_rollover_count(7)?;
    s.update_rollover_count(8)?;
    assert_eq!(
        s.rollover_counter, 1,
        "rolloverCounter was improperly updated for non-significant packets"
    );

    Ok(())
}

#[test]
fn test_rollover_count_never_goes_negative() -> Result<()> {
    let mut s = SrtpSsrcState {
        ssrc: DEFAULT_SSRC,
        ..Default::default()
    };

    s.update_rollover_count(3)?;
    // A late packet from "before" the first one must not underflow.
    s.update_rollover_count(65534)?;
    assert_eq!(s.rollover_counter, 0);

    Ok(())
}

#[test]
fn test_rollover_count_exhausted() -> Result<()> {
    let mut s = SrtpSsrcState {
        ssrc: 7,
        rollover_counter: u32::MAX,
        ..Default::default()
    };

    s.update_rollover_count(65500)?;
    assert_eq!(s.next_rollover_count(65535)?, u32::MAX);
    assert_eq!(
        s.next_rollover_count(0),
        Err(Error::SrtpRolloverExhausted(7))
    );
    assert_eq!(
        s.update_rollover_count(3),
        Err(Error::SrtpRolloverExhausted(7))
    );
    assert_eq!(s.rollover_counter, u32::MAX);

    Ok(())
}

#[test]
fn test_roc_and_index_accessors() -> Result<()> {
    let mut c = Context::new(&[0; 16], &[0; 14], CIPHER_CONTEXT_ALGO, None, None)?;

    assert_eq!(c.get_roc(123), None);
    c.set_roc(123, 5);
    assert_eq!(c.get_roc(123), Some(5));

    assert_eq!(c.get_index(123), None);
    c.set_index(123, 100);
    assert_eq!(c.get_index(123), Some(100));

    Ok(())
}

#[test]
fn test_encrypted_header_extension_ids() -> Result<()> {
    let mut c = Context::new(&[0; 16], &[0; 14], CIPHER_CONTEXT_ALGO, None, None)?;
    assert!(c.encrypted_header_extension_ids().is_empty());

    c.set_encrypted_header_extension_ids(&[1, 4])?;
    assert_eq!(c.encrypted_header_extension_ids(), &[1, 4]);

    c.set_encrypted_header_extension_ids(&[])?;
    assert!(c.encrypted_header_extension_ids().is_empty());

    let mut gcm = Context::new(
        &[0; 16],
        &[0; 12],
        ProtectionProfile::AeadAes128Gcm,
        None,
        None,
    )?;
    assert_eq!(
        gcm.set_encrypted_header_extension_ids(&[1]),
        Err(Error::HeaderExtensionsUnsupportedWithAead)
    );
    assert!(gcm.set_encrypted_header_extension_ids(&[]).is_ok());

    Ok(())
}

#[test]
fn test_external_auth() -> Result<()> {
    let mut c = Context::new(&[0; 16], &[0; 14], CIPHER_CONTEXT_ALGO, None, None)?;
    assert_eq!(c.rtp_auth_key(), Err(Error::ExternalAuthNotEnabled));

    assert!(c.enable_external_auth());
    assert!(c.is_external_auth());
    assert_eq!(c.rtp_auth_key()?.len(), CIPHER_CONTEXT_ALGO.auth_key_len());

    let mut gcm = Context::new(
        &[0; 32],
        &[0; 12],
        ProtectionProfile::AeadAes256Gcm,
        None,
        None,
    )?;
    assert!(!gcm.enable_external_auth());
    assert!(!gcm.is_external_auth());
    assert_eq!(gcm.rtp_auth_key(), Err(Error::ExternalAuthNotEnabled));

    Ok(())
}
