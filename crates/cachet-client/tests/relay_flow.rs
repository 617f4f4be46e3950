//! End-to-end flows through an in-process server: enrolment, activation,
//! send, list, fetch, delete, and the peer policy gate.

mod common;

use cachet_client::{ClientError, Endpoint, VaultStrategy};
use cachet_server::Storage;
use common::World;

#[test]
fn happy_path_send_list_fetch_delete() {
    let world = World::new();
    let transport = world.transport();

    let mut alice = world.activated_endpoint("a@example.com");
    let mut bob = world.activated_endpoint("b@example.com");

    let receipts = alice
        .send(
            &transport,
            true,
            &["b@example.com".to_string()],
            b"hello",
            "greet",
            "",
        )
        .unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].recipient, "b@example.com");

    // ls: one message with decrypted metadata.
    let entries = bob.list(&transport, true).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sender, "a@example.com");
    let metadata = entries[0].metadata.as_ref().unwrap();
    assert_eq!(metadata.description, "greet");
    assert_eq!(metadata.size, 5);
    assert_eq!(metadata.filename, "");

    // get: verified payload bytes.
    let fetched = bob
        .fetch(&transport, true, &entries[0].id.to_string())
        .unwrap();
    assert_eq!(fetched.payload, b"hello");
    assert_eq!(fetched.sender, "a@example.com");
    assert_eq!(fetched.metadata.description, "greet");

    // rm: inbox back to empty (204 → empty list).
    bob.delete(&transport, &entries[0].id.to_string()).unwrap();
    assert!(bob.list(&transport, true).unwrap().is_empty());
}

#[test]
fn fetch_by_short_prefix() {
    let world = World::new();
    let transport = world.transport();

    let mut alice = world.activated_endpoint("a@example.com");
    let mut bob = world.activated_endpoint("b@example.com");

    let receipts = alice
        .send(
            &transport,
            true,
            &["b@example.com".to_string()],
            b"short id",
            "",
            "",
        )
        .unwrap();

    let prefix = receipts[0].id.to_string()[..8].to_string();
    let fetched = bob.fetch(&transport, true, &prefix).unwrap();
    assert_eq!(fetched.payload, b"short id");
}

#[test]
fn empty_inbox_is_empty_list() {
    let world = World::new();
    let transport = world.transport();

    let mut alice = world.activated_endpoint("a@example.com");
    assert!(alice.list(&transport, true).unwrap().is_empty());
}

#[test]
fn reenrol_with_same_key_is_idempotent() {
    let world = World::new();
    let transport = world.transport();

    let mut alice = world.activated_endpoint("a@example.com");

    // The server already knows this key; re-enrolment succeeds activated.
    let activated = alice.enrol(&transport).unwrap();
    assert!(activated);

    // Exactly one activation notice was ever dispatched.
    assert_eq!(world.mailer.notices().len(), 1);
}

#[test]
fn enrol_with_different_key_conflicts() {
    let world = World::new();
    let transport = world.transport();

    let _alice = world.activated_endpoint("a@example.com");

    // A second endpoint claims the same alias with a fresh keypair.
    let mut imposter =
        Endpoint::create("a@example.com", "https://relay.example.com", VaultStrategy::Clear)
            .unwrap();
    assert!(matches!(
        imposter.enrol(&transport),
        Err(ClientError::Conflict(_))
    ));
}

#[test]
fn wrong_activation_code_keeps_token_usable() {
    let world = World::new();
    let transport = world.transport();

    let mut alice =
        Endpoint::create("a@example.com", "https://relay.example.com", VaultStrategy::Clear)
            .unwrap();
    alice.enrol(&transport).unwrap();

    let notice = world.mailer.last_for("a@example.com").unwrap();
    let wrong_code = if notice.code == 1 { 2 } else { notice.code - 1 };

    // Wrong code: forbidden, and no peer row was created.
    let err = alice
        .activate(&transport, &notice.token, wrong_code)
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport { .. }));
    assert!(world
        .storage
        .peer_by_alias(world.engine.keys().server_id(), "a@example.com")
        .unwrap()
        .is_none());

    // The token is still valid for a correct retry.
    alice
        .activate(&transport, &notice.token, notice.code)
        .unwrap();
    assert!(alice.list(&transport, true).unwrap().is_empty());
}

#[test]
fn unknown_peer_gated_by_policy() {
    let world = World::new();
    let transport = world.transport();

    let mut alice = world.activated_endpoint("a@example.com");
    let _bob = world.activated_endpoint("b@example.com");

    // accept_peers=false: first contact is refused with the hint.
    let err = alice
        .send(
            &transport,
            false,
            &["b@example.com".to_string()],
            b"hi",
            "",
            "",
        )
        .unwrap_err();
    // The hint points the user at `peer add`.
    assert!(format!("{err}").contains("peer add"));
    assert!(matches!(err, ClientError::UnknownPeer(alias) if alias == "b@example.com"));

    // An explicit peer add unblocks the send.
    alice.add_peer(&transport, "b@example.com").unwrap();
    alice
        .send(
            &transport,
            false,
            &["b@example.com".to_string()],
            b"hi",
            "",
            "",
        )
        .unwrap();
}

#[test]
fn fanout_continues_past_failures() {
    use cachet_client::transport::TransportResult;
    use cachet_client::{Transport, TransportError};
    use cachet_proto::wire::{Envelope, SendResponse};

    /// Drops every post addressed to one recipient; everything else goes
    /// through to the real transport.
    struct Partition<T: Transport> {
        inner: T,
        blackhole: String,
    }

    impl<T: Transport> Transport for Partition<T> {
        fn get_challenge(&self) -> TransportResult<cachet_proto::ChallengeRequest> {
            self.inner.get_challenge()
        }
        fn enrol(
            &self,
            alias: &str,
            solution: &cachet_proto::ChallengeResponse,
            request: &cachet_proto::EnrolRequest,
        ) -> TransportResult<cachet_proto::EnrolResponse> {
            self.inner.enrol(alias, solution, request)
        }
        fn activate(
            &self,
            request: &cachet_proto::ActivationRequest,
        ) -> TransportResult<cachet_proto::ActivationResponse> {
            self.inner.activate(request)
        }
        fn get_peer(&self, token: &str, alias: &str) -> TransportResult<cachet_proto::PeerInfo> {
            self.inner.get_peer(token, alias)
        }
        fn get_inbox(&self, token: &str) -> TransportResult<Option<cachet_proto::Inbox>> {
            self.inner.get_inbox(token)
        }
        fn post_message(
            &self,
            token: &str,
            recipient: &str,
            envelope: &Envelope,
        ) -> TransportResult<SendResponse> {
            if recipient == self.blackhole {
                return Err(TransportError::Io("connection reset".into()));
            }
            self.inner.post_message(token, recipient, envelope)
        }
        fn get_message(
            &self,
            token: &str,
            id: &str,
        ) -> TransportResult<cachet_proto::MessageResponse> {
            self.inner.get_message(token, id)
        }
        fn delete_message(&self, token: &str, id: &str) -> TransportResult<()> {
            self.inner.delete_message(token, id)
        }
        fn invite(&self, token: &str, alias: &str) -> TransportResult<()> {
            self.inner.invite(token, alias)
        }
    }

    let world = World::new();
    let transport = Partition {
        inner: world.transport(),
        blackhole: "c@example.com".to_string(),
    };

    let mut alice = world.activated_endpoint("a@example.com");
    let mut bob = world.activated_endpoint("b@example.com");
    let _carol = world.activated_endpoint("c@example.com");

    let err = alice
        .send(
            &transport,
            true,
            &["c@example.com".to_string(), "b@example.com".to_string()],
            b"to both",
            "",
            "",
        )
        .unwrap_err();

    match err {
        ClientError::SendFailed { failures } => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].contains("c@example.com"));
        }
        other => panic!("expected SendFailed, got {other:?}"),
    }

    // Bob still received his copy.
    assert_eq!(bob.list(&transport, true).unwrap().len(), 1);
}

#[test]
fn invite_succeeds() {
    let world = World::new();
    let transport = world.transport();

    let mut alice = world.activated_endpoint("a@example.com");
    alice.invite(&transport, "new@example.com").unwrap();
}

#[test]
fn stale_bearer_token_is_unauthorized() {
    let world = World::new();

    let mut alice = world.activated_endpoint("a@example.com");
    let token = alice.bearer_token().unwrap();

    let now = chrono_now();
    world.engine.authenticate_at(&token, now).unwrap();

    let after_expiry = now + world.engine.policy().bearer_max_age_secs + 1;
    let err = world
        .engine
        .authenticate_at(&token, after_expiry)
        .unwrap_err();
    assert_eq!(err.status(), 401);
}

fn chrono_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_secs() as i64
}
