//! Connection-level key management.
//!
//! Tracks send/recv [`DirectionalKeys`] for each encryption level
//! (Initial, Handshake, Application), derives Initial keys from a DCID,
//! installs keys from handshake-provided secrets and runs 1-RTT key updates.

use core::mem;

use crate::crypto::{derive_initial_secrets_with, derive_key_with, DirectionalKeys, Labels, Secret};
use crate::error::Error;

/// Encryption level: determines which keys to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Initial,
    Handshake,
    /// 1-RTT application data.
    Application,
}

/// Which end of the connection we are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

/// All keys for a QUIC connection, separated by level and direction.
#[derive(Debug)]
pub struct ConnectionKeys {
    labels: Labels,
    initial_send: Option<DirectionalKeys>,
    initial_recv: Option<DirectionalKeys>,
    handshake_send: Option<DirectionalKeys>,
    handshake_recv: Option<DirectionalKeys>,
    application: Option<KeyPhase>,
}

impl ConnectionKeys {
    /// Create an empty key set (no keys installed yet).
    pub fn new(labels: Labels) -> Self {
        Self {
            labels,
            initial_send: None,
            initial_recv: None,
            handshake_send: None,
            handshake_recv: None,
            application: None,
        }
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Derive and install Initial keys from a Destination Connection ID.
    ///
    /// For a client: send = client keys, recv = server keys.
    /// For a server: send = server keys, recv = client keys.
    pub fn derive_initial(&mut self, dcid: &[u8], salt: &[u8], role: Role) -> Result<(), Error> {
        let (client, server) = derive_initial_secrets_with(dcid, salt, &self.labels)?;
        let client_keys = derive_key_with(&client, &self.labels)?;
        let server_keys = derive_key_with(&server, &self.labels)?;

        let (send, recv) = match role {
            Role::Client => (client_keys, server_keys),
            Role::Server => (server_keys, client_keys),
        };
        self.initial_send = Some(send);
        self.initial_recv = Some(recv);
        tracing::debug!(?role, "installed initial keys");
        Ok(())
    }

    /// Install keys derived from handshake secrets.
    ///
    /// Both directions are derived before anything is replaced, so a failure
    /// leaves the previously installed keys in place. Installing application
    /// keys starts a fresh [`KeyPhase`] at generation 0.
    pub fn install(
        &mut self,
        level: Level,
        send_secret: &Secret,
        recv_secret: &Secret,
    ) -> Result<(), Error> {
        match level {
            Level::Application => {
                let phase = KeyPhase::new(send_secret.clone(), recv_secret.clone(), self.labels)?;
                self.application = Some(phase);
            }
            Level::Initial | Level::Handshake => {
                let send = derive_key_with(send_secret, &self.labels)?;
                let recv = derive_key_with(recv_secret, &self.labels)?;
                let (send_slot, recv_slot) = match level {
                    Level::Initial => (&mut self.initial_send, &mut self.initial_recv),
                    _ => (&mut self.handshake_send, &mut self.handshake_recv),
                };
                *send_slot = Some(send);
                *recv_slot = Some(recv);
            }
        }
        tracing::debug!(
            ?level,
            hash = ?send_secret.hash_algorithm(),
            aead = ?send_secret.aead_algorithm(),
            "installed keys"
        );
        Ok(())
    }

    /// Get the send-direction keys for a given level.
    pub fn send_keys(&self, level: Level) -> Option<&DirectionalKeys> {
        match level {
            Level::Initial => self.initial_send.as_ref(),
            Level::Handshake => self.handshake_send.as_ref(),
            Level::Application => self.application.as_ref().map(KeyPhase::send_keys),
        }
    }

    /// Get the recv-direction keys for a given level.
    ///
    /// For the application level these are the current phase's keys; use
    /// [`KeyPhase::recv_keys`] to pick by the received key phase bit.
    pub fn recv_keys(&self, level: Level) -> Option<&DirectionalKeys> {
        match level {
            Level::Initial => self.initial_recv.as_ref(),
            Level::Handshake => self.handshake_recv.as_ref(),
            Level::Application => self.application.as_ref().map(KeyPhase::current_recv_keys),
        }
    }

    pub fn application(&self) -> Option<&KeyPhase> {
        self.application.as_ref()
    }

    pub fn application_mut(&mut self) -> Option<&mut KeyPhase> {
        self.application.as_mut()
    }

    /// Drop both directions of a level. Discarding an empty level is a no-op.
    pub fn discard(&mut self, level: Level) {
        let had_keys = self.has_send_keys(level) || self.has_recv_keys(level);
        match level {
            Level::Initial => {
                self.initial_send = None;
                self.initial_recv = None;
            }
            Level::Handshake => {
                self.handshake_send = None;
                self.handshake_recv = None;
            }
            Level::Application => self.application = None,
        }
        if had_keys {
            tracing::debug!(?level, "discarded keys");
        }
    }

    /// Check if we have send keys at a given level.
    pub fn has_send_keys(&self, level: Level) -> bool {
        self.send_keys(level).is_some()
    }

    /// Check if we have recv keys at a given level.
    pub fn has_recv_keys(&self, level: Level) -> bool {
        self.recv_keys(level).is_some()
    }
}

impl Default for ConnectionKeys {
    fn default() -> Self {
        Self::new(Labels::default())
    }
}

/// 1-RTT keys across key updates.
///
/// Holds the current traffic secrets and keys for both directions, the key
/// phase bit, and the previous receive keys while packets sent before the
/// last update may still arrive.
#[derive(Debug)]
pub struct KeyPhase {
    labels: Labels,
    send_secret: Secret,
    recv_secret: Secret,
    send: DirectionalKeys,
    recv: DirectionalKeys,
    previous_recv: Option<DirectionalKeys>,
    key_phase: bool,
    generation: u64,
}

impl KeyPhase {
    pub fn new(send_secret: Secret, recv_secret: Secret, labels: Labels) -> Result<Self, Error> {
        let send = derive_key_with(&send_secret, &labels)?;
        let recv = derive_key_with(&recv_secret, &labels)?;
        Ok(Self {
            labels,
            send_secret,
            recv_secret,
            send,
            recv,
            previous_recv: None,
            key_phase: false,
            generation: 0,
        })
    }

    /// Current key phase bit.
    pub fn key_phase(&self) -> bool {
        self.key_phase
    }

    /// Number of updates applied since the application keys were installed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn send_keys(&self) -> &DirectionalKeys {
        &self.send
    }

    pub fn current_recv_keys(&self) -> &DirectionalKeys {
        &self.recv
    }

    /// Receive keys for a packet carrying `phase_bit`.
    ///
    /// A bit matching the current phase selects the current keys. A differing
    /// bit selects the previous generation while it is retained; otherwise it
    /// signals a peer-initiated update and `None` is returned (see
    /// [`next_recv_keys`](Self::next_recv_keys)).
    pub fn recv_keys(&self, phase_bit: bool) -> Option<&DirectionalKeys> {
        if phase_bit == self.key_phase {
            Some(&self.recv)
        } else {
            self.previous_recv.as_ref()
        }
    }

    /// Derive the receive keys of the next generation without committing to
    /// them, for trial decryption of a packet with a flipped phase bit.
    pub fn next_recv_keys(&self) -> Result<DirectionalKeys, Error> {
        let next = self.recv_secret.next_generation(&self.labels)?;
        derive_key_with(&next, &self.labels)
    }

    /// Move both directions to the next generation and flip the phase bit.
    ///
    /// The current receive keys become the previous generation until
    /// [`retire_previous`](Self::retire_previous) is called; any older
    /// generation still retained is dropped. Nothing changes on error.
    pub fn update(&mut self) -> Result<(), Error> {
        let send_secret = self.send_secret.next_generation(&self.labels)?;
        let recv_secret = self.recv_secret.next_generation(&self.labels)?;
        let send = derive_key_with(&send_secret, &self.labels)?;
        let recv = derive_key_with(&recv_secret, &self.labels)?;

        self.send_secret = send_secret;
        self.recv_secret = recv_secret;
        self.send = send;
        let old_recv = mem::replace(&mut self.recv, recv);
        if self.previous_recv.replace(old_recv).is_some() {
            tracing::debug!("dropped unretired receive keys");
        }
        self.key_phase = !self.key_phase;
        self.generation += 1;

        tracing::debug!(
            generation = self.generation,
            key_phase = self.key_phase,
            "key update"
        );
        Ok(())
    }

    /// Drop the previous generation's receive keys. Idempotent.
    pub fn retire_previous(&mut self) {
        if self.previous_recv.take().is_some() {
            tracing::debug!(generation = self.generation, "retired previous keys");
        }
    }

    pub fn has_previous(&self) -> bool {
        self.previous_recv.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_schedule::INITIAL_SALT_V1;
    use crate::crypto::{AeadAlgorithm, HashAlgorithm};

    fn secret(byte: u8) -> Secret {
        Secret::new(HashAlgorithm::Sha256, AeadAlgorithm::Aes128Gcm, &[byte; 32]).unwrap()
    }

    #[test]
    fn derive_initial_client_keys() {
        let mut keys = ConnectionKeys::default();
        let dcid = [0x83, 0x94, 0xc8, 0xf0, 0x3e, 0x51, 0x57, 0x08];
        keys.derive_initial(&dcid, &INITIAL_SALT_V1, Role::Client).unwrap();

        assert!(keys.has_send_keys(Level::Initial));
        assert!(keys.has_recv_keys(Level::Initial));
        assert!(!keys.has_send_keys(Level::Handshake));
        assert!(!keys.has_send_keys(Level::Application));
    }

    #[test]
    fn derive_initial_server_keys_swapped() {
        let dcid = [0x01, 0x02, 0x03, 0x04];

        let mut client_keys = ConnectionKeys::default();
        client_keys.derive_initial(&dcid, &INITIAL_SALT_V1, Role::Client).unwrap();

        let mut server_keys = ConnectionKeys::default();
        server_keys.derive_initial(&dcid, &INITIAL_SALT_V1, Role::Server).unwrap();

        // Client send IV should equal server recv IV, and vice versa
        assert_eq!(
            client_keys.send_keys(Level::Initial).unwrap().iv(),
            server_keys.recv_keys(Level::Initial).unwrap().iv()
        );
        assert_eq!(
            client_keys.recv_keys(Level::Initial).unwrap().iv(),
            server_keys.send_keys(Level::Initial).unwrap().iv()
        );
    }

    #[test]
    fn derive_initial_rejects_bad_cid_and_keeps_state() {
        let mut keys = ConnectionKeys::default();
        assert_eq!(
            keys.derive_initial(&[], &INITIAL_SALT_V1, Role::Client),
            Err(Error::InvalidLength)
        );
        assert!(!keys.has_send_keys(Level::Initial));
    }

    #[test]
    fn install_handshake_keys() {
        let mut keys = ConnectionKeys::default();
        keys.install(Level::Handshake, &secret(0xAA), &secret(0xBB)).unwrap();
        assert!(keys.has_send_keys(Level::Handshake));
        assert!(keys.has_recv_keys(Level::Handshake));
        assert!(!keys.has_send_keys(Level::Application));
    }

    #[test]
    fn install_failure_keeps_previous_keys() {
        let mut keys = ConnectionKeys::default();
        keys.install(Level::Handshake, &secret(0xAA), &secret(0xBB)).unwrap();
        let iv = *keys.send_keys(Level::Handshake).unwrap().iv();

        let weak = Secret {
            hash: HashAlgorithm::Sha1,
            aead: AeadAlgorithm::Aes128Gcm,
            bytes: [0; 64],
        };
        assert_eq!(
            keys.install(Level::Handshake, &secret(0xCC), &weak),
            Err(Error::UnsupportedAlgorithm)
        );
        assert_eq!(keys.send_keys(Level::Handshake).unwrap().iv(), &iv);
    }

    #[test]
    fn discard_is_idempotent() {
        let mut keys = ConnectionKeys::default();
        keys.derive_initial(&[1, 2, 3, 4], &INITIAL_SALT_V1, Role::Client).unwrap();
        keys.install(Level::Application, &secret(1), &secret(2)).unwrap();

        keys.discard(Level::Initial);
        assert!(!keys.has_send_keys(Level::Initial));
        assert!(!keys.has_recv_keys(Level::Initial));
        keys.discard(Level::Initial);
        keys.discard(Level::Handshake);
        assert!(keys.has_send_keys(Level::Application));

        keys.discard(Level::Application);
        assert!(keys.application().is_none());
    }

    #[test]
    fn encrypt_decrypt_with_initial_keys() {
        let dcid = [0x01, 0x02, 0x03, 0x04];

        let mut client_keys = ConnectionKeys::default();
        client_keys.derive_initial(&dcid, &INITIAL_SALT_V1, Role::Client).unwrap();

        let mut server_keys = ConnectionKeys::default();
        server_keys.derive_initial(&dcid, &INITIAL_SALT_V1, Role::Server).unwrap();

        // Client encrypts, server decrypts
        let plaintext = b"hello server";
        let aad = b"packet header";
        let mut buf = [0u8; 128];
        buf[..plaintext.len()].copy_from_slice(plaintext);

        let send = client_keys.send_keys(Level::Initial).unwrap();
        let ct_len = send.seal_in_place(0, aad, &mut buf, plaintext.len()).unwrap();

        let recv = server_keys.recv_keys(Level::Initial).unwrap();
        let pt_len = recv.open_in_place(0, aad, &mut buf, ct_len).unwrap();
        assert_eq!(&buf[..pt_len], plaintext);
    }

    #[test]
    fn key_update_flips_phase_and_keeps_previous() {
        let mut phase = KeyPhase::new(secret(1), secret(2), Labels::QUIC).unwrap();
        assert!(!phase.key_phase());
        let old_recv_iv = *phase.current_recv_keys().iv();

        phase.update().unwrap();
        assert!(phase.key_phase());
        assert_eq!(phase.generation(), 1);
        assert!(phase.has_previous());
        assert_eq!(phase.recv_keys(false).unwrap().iv(), &old_recv_iv);
        assert_ne!(phase.recv_keys(true).unwrap().iv(), &old_recv_iv);

        phase.retire_previous();
        phase.retire_previous();
        assert!(!phase.has_previous());
        assert!(phase.recv_keys(false).is_none());
    }

    #[test]
    fn next_recv_keys_match_update() {
        let mut phase = KeyPhase::new(secret(3), secret(4), Labels::QUIC).unwrap();
        let candidate = phase.next_recv_keys().unwrap();
        phase.update().unwrap();
        assert_eq!(candidate.iv(), phase.current_recv_keys().iv());
        assert_eq!(candidate.bulk_key(), phase.current_recv_keys().bulk_key());
    }
}
