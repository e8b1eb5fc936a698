//! End-to-end submission API flow against in-process state
//!
//! Drives the axum handlers directly: two identities create, join, send, and
//! run the key handshake through the same request/response types the CLI uses.

use axum::extract::{Json, State};
use axum::response::IntoResponse;
use http::StatusCode;
use serde::de::DeserializeOwned;

use common::client::DEFAULT_AUTHORIZATION_WINDOW_SECS;
use common::crypto::{Envelope, SealedSecret, SecretKey, SharedSecret};
use common::gate::{AuthorizationProof, DecryptionRequest, SecretHandle, ValidityWindow};
use service::{Config, ServiceState};

use shroud_app::http::api::v0::net::{
    create, decrypt_key, join, list, messages, send, CreateRequest, DecryptKeyRequest,
    JoinRequest, ListRequest, MessagesRequest, SendRequest,
};

async fn into_json<T: DeserializeOwned>(response: impl IntoResponse) -> T {
    let response = response.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

fn signed_handshake(handle: &str, identity: &SecretKey, session: &SecretKey) -> DecryptKeyRequest {
    let proof = AuthorizationProof::sign(
        DecryptionRequest {
            handle: SecretHandle::from_hex(handle).unwrap(),
            identity: identity.public(),
            session_key: session.public(),
            window: ValidityWindow::new(now_unix(), DEFAULT_AUTHORIZATION_WINDOW_SECS),
        },
        identity,
    );
    DecryptKeyRequest::from_proof(&proof)
}

#[tokio::test]
async fn test_full_api_flow() {
    let state = ServiceState::from_config(&Config::default()).unwrap();
    let alice = SecretKey::generate();
    let bob = SecretKey::generate();

    // Alice creates a net with a known key
    let clear_key = SharedSecret::from_hex("0x1111111111111111111111111111111111111111").unwrap();
    let created: create::CreateResponse = into_json(
        create::handler(
            State(state.clone()),
            Json(CreateRequest::sign("Test Net".to_string(), &clear_key, &alice)),
        )
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(created.net_id, 0);
    assert_eq!(created.member_count, 1);

    // Bob sees the net but is not a member
    let listing: list::ListResponse = into_json(
        list::handler(
            State(state.clone()),
            Json(ListRequest {
                identity: Some(bob.public().to_hex()),
            }),
        )
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(listing.nets.len(), 1);
    assert_eq!(listing.nets[0].name, "Test Net");
    assert_eq!(listing.nets[0].is_member, Some(false));

    // Bob's handshake is denied before joining
    let session = SecretKey::generate();
    let denied = decrypt_key::handler(
        State(state.clone()),
        Json(signed_handshake(&created.handle, &bob, &session)),
    )
    .await;
    let response = denied.err().unwrap().into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Bob joins; repeat joins conflict
    let joined: join::JoinResponse = into_json(
        join::handler(State(state.clone()), Json(JoinRequest::sign(0, &bob)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(joined.member_count, 2);

    let repeat = join::handler(State(state.clone()), Json(JoinRequest::sign(0, &bob))).await;
    let response = repeat.err().unwrap().into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Now the handshake releases the key, sealed to Bob's session key
    let released: decrypt_key::DecryptKeyResponse = into_json(
        decrypt_key::handler(
            State(state.clone()),
            Json(signed_handshake(&created.handle, &bob, &session)),
        )
        .await
        .unwrap(),
    )
    .await;
    let recovered = SealedSecret::from_hex(&released.sealed)
        .unwrap()
        .open(&session)
        .unwrap();
    assert_eq!(recovered, clear_key);

    // Bob encrypts and sends; Alice reads and decrypts
    let envelope = recovered.derive_key().encrypt("hello from bob").unwrap();
    let sent: send::SendResponse = into_json(
        send::handler(
            State(state.clone()),
            Json(SendRequest::sign(0, envelope.as_bytes(), &bob)),
        )
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(sent.message_count, 1);

    let page: messages::MessagesResponse = into_json(
        messages::handler(
            State(state.clone()),
            Json(MessagesRequest {
                net_id: 0,
                start: 0,
                limit: 50,
            }),
        )
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(page.senders.len(), 1);
    assert_eq!(page.senders[0], bob.public().to_hex());

    let envelope = Envelope::from_hex(&page.payloads[0]).unwrap();
    assert_eq!(
        clear_key.derive_key().decrypt(&envelope).unwrap(),
        "hello from bob"
    );
}

#[tokio::test]
async fn test_outsider_send_is_rejected() {
    let state = ServiceState::from_config(&Config::default()).unwrap();
    let alice = SecretKey::generate();
    let eve = SecretKey::generate();

    let secret = SharedSecret::generate();
    let _: create::CreateResponse = into_json(
        create::handler(
            State(state.clone()),
            Json(CreateRequest::sign("Members Only".to_string(), &secret, &alice)),
        )
        .await
        .unwrap(),
    )
    .await;

    // non-member send is forbidden
    let result = send::handler(
        State(state.clone()),
        Json(SendRequest::sign(0, &[0x12, 0x34], &eve)),
    )
    .await;
    let response = result.err().unwrap().into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // a tampered submission never reaches the record
    let mut forged = SendRequest::sign(0, &[0x12, 0x34], &alice);
    forged.payload = "0xdeadbeef".to_string();
    let result = send::handler(State(state.clone()), Json(forged)).await;
    let response = result.err().unwrap().into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // an expired proof is told apart from a denied one
    let handle: shroud_app::http::api::v0::net::handle::HandleResponse = into_json(
        shroud_app::http::api::v0::net::handle::handler(
            State(state.clone()),
            Json(shroud_app::http::api::v0::net::HandleRequest { net_id: 0 }),
        )
        .await
        .unwrap(),
    )
    .await;

    let session = SecretKey::generate();
    let stale = AuthorizationProof::sign(
        DecryptionRequest {
            handle: SecretHandle::from_hex(&handle.handle).unwrap(),
            identity: alice.public(),
            session_key: session.public(),
            window: ValidityWindow::new(now_unix().saturating_sub(120), 60),
        },
        &alice,
    );
    let result = decrypt_key::handler(
        State(state.clone()),
        Json(DecryptKeyRequest::from_proof(&stale)),
    )
    .await;
    let response = result.err().unwrap().into_response();
    assert_eq!(response.status(), StatusCode::GONE);
}
