//! CLI command implementations
//!
//! Each command is one member-side flow against a running daemon: sign the
//! submission locally, call the API, and re-read whatever the daemon reports
//! back. Message and key plaintext only ever exist on this side of the wire.

use anyhow::{anyhow, Result};

use common::client::DEFAULT_AUTHORIZATION_WINDOW_SECS;
use common::crypto::{Envelope, SealedSecret, SecretKey, SharedSecret};
use common::gate::{AuthorizationProof, DecryptionRequest, SecretHandle, ValidityWindow};

use crate::http::api::client::ApiClient;
use crate::http::api::v0::net::{
    CreateRequest, DecryptKeyRequest, HandleRequest, JoinRequest, ListRequest, MessagesRequest,
    SendRequest,
};

fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Run the gate handshake and recover a net's shared secret
///
/// Generates a one-off session keypair and a freshly signed proof per call;
/// the daemon only ever sees the sealed response's public half.
async fn recover_secret(api: &ApiClient, key: &SecretKey, net_id: u64) -> Result<SharedSecret> {
    let handle = api.call(HandleRequest { net_id }).await?;
    let handle = SecretHandle::from_hex(&handle.handle)?;

    let session = SecretKey::generate();
    let proof = AuthorizationProof::sign(
        DecryptionRequest {
            handle,
            identity: key.public(),
            session_key: session.public(),
            window: ValidityWindow::new(now_unix(), DEFAULT_AUTHORIZATION_WINDOW_SECS),
        },
        key,
    );

    let response = api.call(DecryptKeyRequest::from_proof(&proof)).await?;
    let sealed = SealedSecret::from_hex(&response.sealed)
        .map_err(|e| anyhow!("malformed sealed response: {}", e))?;
    Ok(sealed.open(&session)?)
}

/// List all nets, with membership for the local identity
pub async fn nets(api: &ApiClient, key: &SecretKey) -> Result<()> {
    let response = api
        .call(ListRequest {
            identity: Some(key.public().to_hex()),
        })
        .await?;

    if response.nets.is_empty() {
        println!("no nets yet");
        return Ok(());
    }
    for net in response.nets {
        let membership = match net.is_member {
            Some(true) => " (member)",
            _ => "",
        };
        println!(
            "#{} {} - {} members, created {} by {}{}",
            net.net_id,
            net.name,
            net.member_count,
            net.created_at,
            &net.creator[..8],
            membership
        );
    }
    Ok(())
}

/// Create a net with a fresh (or supplied) shared key
pub async fn create(api: &ApiClient, key: &SecretKey, name: &str, shared_key: Option<&str>) -> Result<()> {
    let secret = match shared_key {
        Some(hex) => SharedSecret::from_hex(hex)?,
        None => SharedSecret::generate(),
    };

    let response = api
        .call(CreateRequest::sign(name.to_string(), &secret, key))
        .await?;

    println!(
        "created net #{} \"{}\" key={}",
        response.net_id,
        response.name,
        secret.to_hex()
    );
    Ok(())
}

/// Join a net and gain decryption rights for its key
pub async fn join(api: &ApiClient, key: &SecretKey, net_id: u64) -> Result<()> {
    let response = api.call(JoinRequest::sign(net_id, key)).await?;
    println!(
        "joined net #{} ({} members)",
        response.net_id, response.member_count
    );
    Ok(())
}

/// Recover and print a net's shared key
pub async fn decrypt_key(api: &ApiClient, key: &SecretKey, net_id: u64) -> Result<()> {
    let secret = recover_secret(api, key, net_id).await?;
    println!("net #{} key={}", net_id, secret.to_hex());
    Ok(())
}

/// Encrypt a text message and append it to a net's log
pub async fn send(api: &ApiClient, key: &SecretKey, net_id: u64, message: &str) -> Result<()> {
    let secret = recover_secret(api, key, net_id).await?;
    let envelope = secret.derive_key().encrypt(message)?;

    let response = api
        .call(SendRequest::sign(net_id, envelope.as_bytes(), key))
        .await?;
    println!(
        "sent message to net #{} ({} messages)",
        response.net_id, response.message_count
    );
    Ok(())
}

/// Read a page of a net's log, optionally decrypting each payload
pub async fn messages(
    api: &ApiClient,
    key: &SecretKey,
    request: MessagesRequest,
    decrypt: bool,
) -> Result<()> {
    let net_id = request.net_id;
    let response = api.call(request).await?;

    if response.senders.is_empty() {
        println!("no messages in net #{}", net_id);
        return Ok(());
    }

    let secret = if decrypt {
        Some(recover_secret(api, key, net_id).await?)
    } else {
        None
    };

    for (index, ((sender, timestamp), payload)) in response
        .senders
        .iter()
        .zip(&response.timestamps)
        .zip(&response.payloads)
        .enumerate()
    {
        let position = response.start + index as u64;
        match &secret {
            Some(secret) => {
                let envelope = Envelope::from_hex(payload)
                    .and_then(|e| secret.derive_key().decrypt(&e));
                match envelope {
                    Ok(text) => println!("#{} {} @{}: {}", position, &sender[..8], timestamp, text),
                    Err(_) => println!(
                        "#{} {} @{}: <undecryptable payload>",
                        position,
                        &sender[..8],
                        timestamp
                    ),
                }
            }
            None => println!("#{} {} @{}: {}", position, &sender[..8], timestamp, payload),
        }
    }
    Ok(())
}
