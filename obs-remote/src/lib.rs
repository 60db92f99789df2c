//! Minimal obs-websocket v5 client.
//!
//! This crate provides:
//! - Connection and identification, with password authentication
//! - One-at-a-time request/response calls
//! - Helpers for reading and writing input settings

pub mod auth;
pub mod protocol;

use futures::{SinkExt, StreamExt};
use protocol::{
    frame, Hello, Identified, Identify, RawFrame, Request, RequestResponse, OP_EVENT, OP_HELLO,
    OP_IDENTIFIED, OP_IDENTIFY, OP_REQUEST, OP_REQUEST_RESPONSE, RPC_VERSION,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};
use uuid::Uuid;

pub const DEFAULT_PORT: u16 = 4455;

/// Errors that can occur when talking to the host.
#[derive(Debug, Error)]
pub enum Error {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server requires a password but none was configured")]
    AuthRequired,

    #[error("Request {request_type} failed (code {code}): {comment}")]
    Request {
        request_type: String,
        code: u16,
        comment: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed: {0}")]
    Closed(String),
}

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl ConnectOptions {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: None,
        }
    }

    /// Set the server password. An empty password means none.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.password = (!password.is_empty()).then_some(password);
        self
    }

    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT)
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An identified obs-websocket session.
pub struct ObsClient {
    socket: Socket,
    rpc_version: u32,
}

impl ObsClient {
    /// Connect and identify.
    pub async fn connect(options: &ConnectOptions) -> Result<Self, Error> {
        let (mut socket, _) = connect_async(options.url()).await?;

        let hello: Hello = expect(&mut socket, OP_HELLO).await?;
        debug!(
            server = %hello.obs_web_socket_version,
            rpc = hello.rpc_version,
            auth = hello.authentication.is_some(),
            "received hello"
        );

        let authentication = match (&hello.authentication, options.password.as_deref()) {
            (Some(challenge), Some(password)) => Some(auth::authentication_string(
                password,
                &challenge.salt,
                &challenge.challenge,
            )),
            (Some(_), None) => return Err(Error::AuthRequired),
            (None, _) => None,
        };

        let identify = Identify {
            rpc_version: RPC_VERSION,
            authentication,
            event_subscriptions: 0,
        };
        send(&mut socket, &frame(OP_IDENTIFY, &identify)?).await?;

        let identified: Identified = expect(&mut socket, OP_IDENTIFIED).await?;
        Ok(Self {
            socket,
            rpc_version: identified.negotiated_rpc_version,
        })
    }

    /// RPC version agreed with the server.
    pub fn rpc_version(&self) -> u32 {
        self.rpc_version
    }

    /// Send a request and wait for its response data.
    ///
    /// Events and responses to other requests received meanwhile are dropped.
    pub async fn request(&mut self, request_type: &str, data: Option<Value>) -> Result<Value, Error> {
        let request_id = Uuid::new_v4().to_string();
        let request = Request {
            request_type,
            request_id: &request_id,
            request_data: data,
        };
        send(&mut self.socket, &frame(OP_REQUEST, &request)?).await?;

        loop {
            let raw = recv(&mut self.socket).await?;
            if raw.op != OP_REQUEST_RESPONSE {
                if raw.op == OP_EVENT {
                    trace!("dropping event while waiting for {request_type}");
                } else {
                    debug!(op = raw.op, "dropping unexpected frame");
                }
                continue;
            }

            let response: RequestResponse = serde_json::from_value(raw.d)?;
            if response.request_id != request_id {
                continue;
            }

            let status = response.request_status;
            if !status.result {
                return Err(Error::Request {
                    request_type: response.request_type,
                    code: status.code,
                    comment: status.comment.unwrap_or_default(),
                });
            }
            return Ok(response.response_data.unwrap_or(Value::Null));
        }
    }

    /// Current settings of an input.
    pub async fn get_input_settings(&mut self, input_name: &str) -> Result<Map<String, Value>, Error> {
        let data = self
            .request("GetInputSettings", Some(json!({ "inputName": input_name })))
            .await?;
        match data {
            Value::Object(mut fields) => match fields.remove("inputSettings") {
                Some(Value::Object(settings)) => Ok(settings),
                _ => Err(Error::Protocol("response has no inputSettings object".to_string())),
            },
            _ => Err(Error::Protocol("GetInputSettings returned no data".to_string())),
        }
    }

    /// Write settings to an input.
    ///
    /// With `overlay` the given keys are merged over the current settings;
    /// otherwise they replace them.
    pub async fn set_input_settings(
        &mut self,
        input_name: &str,
        settings: Map<String, Value>,
        overlay: bool,
    ) -> Result<(), Error> {
        self.request(
            "SetInputSettings",
            Some(json!({
                "inputName": input_name,
                "inputSettings": settings,
                "overlay": overlay,
            })),
        )
        .await?;
        Ok(())
    }

    /// Close the connection.
    pub async fn disconnect(mut self) -> Result<(), Error> {
        match self.socket.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn send(socket: &mut Socket, value: &Value) -> Result<(), Error> {
    socket.send(Message::Text(serde_json::to_string(value)?)).await?;
    Ok(())
}

async fn recv(socket: &mut Socket) -> Result<RawFrame, Error> {
    loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
            Some(Ok(Message::Close(close))) => {
                let reason = close
                    .map(|f| format!("{} ({})", f.reason, u16::from(f.code)))
                    .unwrap_or_else(|| "no reason given".to_string());
                return Err(Error::Closed(reason));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => return Err(Error::Closed("stream ended".to_string())),
        }
    }
}

async fn expect<T: DeserializeOwned>(socket: &mut Socket, op: u8) -> Result<T, Error> {
    let raw = recv(socket).await?;
    if raw.op != op {
        return Err(Error::Protocol(format!("expected op {op}, got op {}", raw.op)));
    }
    Ok(serde_json::from_value(raw.d)?)
}
