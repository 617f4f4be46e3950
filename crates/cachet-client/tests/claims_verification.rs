//! Claims keep the server honest: a recipient detects stored-content
//! tampering and sender-key forgery before ever decrypting a payload.

mod common;

use cachet_client::ClientError;
use cachet_proto::Claims;
use cachet_server::{MessageSelector, Storage, StoredMessage};
use common::World;

#[test]
fn tampered_payload_fails_before_decryption() {
    let world = World::new();
    let transport = world.transport();

    let mut alice = world.activated_endpoint("a@example.com");
    let mut bob = world.activated_endpoint("b@example.com");

    let receipts = alice
        .send(
            &transport,
            true,
            &["b@example.com".to_string()],
            b"genuine",
            "",
            "",
        )
        .unwrap();
    let id = receipts[0].id;

    // The server swaps the stored payload for random bytes.
    let server = world.engine.keys().server_id();
    let bob_peer = world.peer_id("b@example.com");
    let stored = world
        .storage
        .message_by_selector(server, bob_peer, MessageSelector::Full(id))
        .unwrap();
    world.storage.delete_message(server, id).unwrap();
    world
        .storage
        .insert_message(&StoredMessage {
            payload: vec![0x5A; stored.payload.len()],
            ..stored
        })
        .unwrap();

    assert!(matches!(
        bob.fetch(&transport, true, &id.to_string()),
        Err(ClientError::ClaimMismatch)
    ));
}

#[test]
fn tampered_metadata_fails_fetch() {
    let world = World::new();
    let transport = world.transport();

    let mut alice = world.activated_endpoint("a@example.com");
    let mut bob = world.activated_endpoint("b@example.com");

    let receipts = alice
        .send(
            &transport,
            true,
            &["b@example.com".to_string()],
            b"genuine",
            "",
            "",
        )
        .unwrap();
    let id = receipts[0].id;

    let server = world.engine.keys().server_id();
    let bob_peer = world.peer_id("b@example.com");
    let stored = world
        .storage
        .message_by_selector(server, bob_peer, MessageSelector::Full(id))
        .unwrap();
    world.storage.delete_message(server, id).unwrap();

    let mut metadata = stored.metadata.clone();
    let last = metadata.len() - 1;
    metadata[last] ^= 0xFF;
    world
        .storage
        .insert_message(&StoredMessage { metadata, ..stored })
        .unwrap();

    assert!(matches!(
        bob.fetch(&transport, true, &id.to_string()),
        Err(ClientError::ClaimMismatch)
    ));
}

#[test]
fn forged_sender_key_is_rejected() {
    let world = World::new();
    let transport = world.transport();

    let _carol = world.activated_endpoint("c@example.com");
    let mut bob = world.activated_endpoint("b@example.com");

    // Bob holds carol's real key in his directory.
    bob.add_peer(&transport, "c@example.com").unwrap();

    // The server fabricates a message "from carol" but claims a key that
    // is not the one bob has committed to.
    let impostor_key = cachet_crypto::BoxSecretKey::generate();
    let bob_record = world
        .storage
        .peer_by_alias(world.engine.keys().server_id(), "b@example.com")
        .unwrap()
        .unwrap();
    let bob_key = cachet_crypto::BoxPublicKey::from_bytes(&bob_record.public_key).unwrap();

    let payload = cachet_crypto::seal_box(b"fake", &bob_key, &impostor_key).unwrap();
    let metadata = cachet_crypto::seal_box(b"{}", &bob_key, &impostor_key).unwrap();

    let id = uuid::Uuid::new_v4();
    let claims = Claims::over(
        id,
        "c@example.com",
        impostor_key.public_key().to_bytes().to_vec(),
        &payload,
        &metadata,
        0,
    );
    let sealed_claims = cachet_crypto::seal_box(
        &claims.to_bytes().unwrap(),
        &bob_key,
        world.engine.keys().box_secret(),
    )
    .unwrap();

    world
        .storage
        .insert_message(&StoredMessage {
            server: world.engine.keys().server_id(),
            recipient: bob_record.peer,
            id,
            sender: uuid::Uuid::new_v4(),
            sender_alias: "c@example.com".into(),
            received: 0,
            metadata,
            payload,
            claims: sealed_claims,
        })
        .unwrap();

    assert!(matches!(
        bob.fetch(&transport, true, &id.to_string()),
        Err(ClientError::ClaimMismatch)
    ));
}

#[test]
fn claims_for_another_message_are_rejected() {
    let world = World::new();
    let transport = world.transport();

    let mut alice = world.activated_endpoint("a@example.com");
    let mut bob = world.activated_endpoint("b@example.com");

    // Two genuine messages; the server replays the first message's
    // claims onto the second.
    let first = alice
        .send(&transport, true, &["b@example.com".to_string()], b"one", "", "")
        .unwrap()[0]
        .id;
    let second = alice
        .send(&transport, true, &["b@example.com".to_string()], b"two", "", "")
        .unwrap()[0]
        .id;

    let server = world.engine.keys().server_id();
    let bob_peer = world.peer_id("b@example.com");
    let donor = world
        .storage
        .message_by_selector(server, bob_peer, MessageSelector::Full(first))
        .unwrap();
    let victim = world
        .storage
        .message_by_selector(server, bob_peer, MessageSelector::Full(second))
        .unwrap();

    world.storage.delete_message(server, second).unwrap();
    world
        .storage
        .insert_message(&StoredMessage {
            claims: donor.claims.clone(),
            ..victim
        })
        .unwrap();

    assert!(matches!(
        bob.fetch(&transport, true, &second.to_string()),
        Err(ClientError::ClaimMismatch)
    ));
}
