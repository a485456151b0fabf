//! Per-connection handler: handshake, auth, and request dispatch.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version
//!   2. Authenticate token → get UserId
//!   3. Send HandshakeAck
//!   4. Loop: receive envelopes → answer heartbeats and API requests

use std::sync::Arc;

use pokedrafter_draft::DraftStore;
use pokedrafter_protocol::{Codec, Envelope, Payload, ProtocolError, SystemMessage, UserId};

use crate::api::{Request, dispatch, status_code};
use crate::server::{PROTOCOL_VERSION, ServerState};
use crate::transport::{Connection, WebSocketConnection};
use crate::{Authenticator, PokedrafterError};

/// Outbound sequence numbers for one connection.
struct Outbound<'a, S: DraftStore, A: Authenticator, C: Codec> {
    conn: &'a WebSocketConnection,
    state: &'a ServerState<S, A, C>,
    seq: u64,
}

impl<S: DraftStore, A: Authenticator, C: Codec> Outbound<'_, S, A, C> {
    async fn send(&mut self, reply_to: Option<u64>, payload: Payload) -> Result<(), PokedrafterError> {
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.state.server_time(),
            reply_to,
            payload,
        };
        self.seq += 1;
        let bytes = self.state.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn send_error(
        &mut self,
        reply_to: Option<u64>,
        code: u16,
        kind: &str,
        message: String,
    ) -> Result<(), PokedrafterError> {
        let payload = Payload::System(SystemMessage::Error {
            code,
            kind: kind.to_string(),
            message,
        });
        self.send(reply_to, payload).await
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, A, C>>,
) -> Result<(), PokedrafterError>
where
    S: DraftStore,
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut out = Outbound {
        conn: &conn,
        state: &state,
        seq: 0,
    };

    let user = perform_handshake(&mut out).await?;
    tracing::info!(%conn_id, %user, "user authenticated");

    loop {
        let data = match tokio::time::timeout(state.config.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%user, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%user, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%user, "connection timed out");
                break;
            }
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%user, error = %e, "failed to decode envelope");
                out.send_error(None, 400, "InvalidMessage", e.to_string()).await?;
                continue;
            }
        };

        match envelope.payload {
            Payload::System(msg) => {
                if handle_system_message(&mut out, user, envelope.seq, msg).await? {
                    break;
                }
            }
            Payload::Api(bytes) => {
                handle_api_request(&mut out, user, envelope.seq, &bytes).await?;
            }
        }
    }

    let _ = conn.close().await;
    Ok(())
}

/// Receives the handshake, checks the version, authenticates and acks.
async fn perform_handshake<S, A, C>(out: &mut Outbound<'_, S, A, C>) -> Result<UserId, PokedrafterError>
where
    S: DraftStore,
    A: Authenticator,
    C: Codec,
{
    let state = out.state;
    let data = match tokio::time::timeout(state.config.handshake_timeout, out.conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("connection closed before handshake".into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope = state.codec.decode(&data)?;
    let reply_to = Some(envelope.seq);

    let (version, token) = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version, token }) => (version, token),
        _ => {
            out.send_error(reply_to, 400, "HandshakeRequired", "expected Handshake".into())
                .await?;
            return Err(ProtocolError::InvalidMessage("first message must be Handshake".into()).into());
        }
    };

    if version != PROTOCOL_VERSION {
        out.send_error(
            reply_to,
            400,
            "VersionMismatch",
            format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let user = match state.auth.authenticate(token.as_deref().unwrap_or("")).await {
        Ok(user) => user,
        Err(e) => {
            out.send_error(reply_to, 401, "Unauthorized", "unauthorized".into())
                .await?;
            return Err(e.into());
        }
    };

    let ack = Payload::System(SystemMessage::HandshakeAck {
        user_id: user,
        server_time: state.server_time(),
    });
    out.send(reply_to, ack).await?;
    Ok(user)
}

/// Handles a system message. Returns `true` if the connection should close.
async fn handle_system_message<S, A, C>(
    out: &mut Outbound<'_, S, A, C>,
    user: UserId,
    seq: u64,
    msg: SystemMessage,
) -> Result<bool, PokedrafterError>
where
    S: DraftStore,
    A: Authenticator,
    C: Codec,
{
    match msg {
        SystemMessage::Heartbeat { client_time } => {
            let ack = Payload::System(SystemMessage::HeartbeatAck {
                client_time,
                server_time: out.state.server_time(),
            });
            out.send(Some(seq), ack).await?;
        }
        SystemMessage::Disconnect { reason } => {
            tracing::info!(%user, %reason, "client disconnected");
            return Ok(true);
        }
        _ => {
            tracing::debug!(%user, "ignoring unexpected system message");
        }
    }
    Ok(false)
}

/// Decodes and runs one API request, answering with a reply or an error.
async fn handle_api_request<S, A, C>(
    out: &mut Outbound<'_, S, A, C>,
    user: UserId,
    seq: u64,
    bytes: &[u8],
) -> Result<(), PokedrafterError>
where
    S: DraftStore,
    A: Authenticator,
    C: Codec,
{
    let state = out.state;
    let request: Request = match state.codec.decode(bytes) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(%user, error = %e, "invalid request");
            return out
                .send_error(Some(seq), 400, "InvalidRequest", e.to_string())
                .await;
        }
    };

    match dispatch(state, user, request).await {
        Ok(reply) => {
            let bytes = state.codec.encode(&reply)?;
            out.send(Some(seq), Payload::Api(bytes)).await
        }
        Err(err) => {
            let code = status_code(&err);
            if err.is_domain() {
                tracing::debug!(%user, kind = err.kind(), error = %err, "request rejected");
            } else {
                tracing::warn!(%user, error = %err, "request failed");
            }
            out.send_error(Some(seq), code, err.kind(), err.to_string())
                .await
        }
    }
}
