//! Random GIF drop for a live video-composition host.
//!
//! Fetches a random GIF for a tag and pushes its URL into a browser source
//! over obs-websocket, then stays connected briefly before disconnecting.
//!
//! ```bash
//! cargo run -p gif-drop -- --tag celebration --source CelebrationGIF
//! ```

mod cli;
mod refresh;

use anyhow::{Context, Result};
use clap::Parser;
use giphy::Giphy;
use obs_remote::ObsClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Options;
use refresh::refresh_settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let options = Options::parse();
    let giphy = Giphy::new(&options.giphy_key);

    drop_gif(&options, &giphy).await
}

/// Connect, drop one GIF, and disconnect whatever happened in between.
async fn drop_gif(options: &Options, giphy: &Giphy) -> Result<()> {
    let connect = options.connect_options();
    info!(address = %connect.url(), "connecting to OBS");
    let mut obs = ObsClient::connect(&connect)
        .await
        .context("failed to connect to obs-websocket")?;
    info!("connected");

    let result = run(&mut obs, giphy, options).await;

    match obs.disconnect().await {
        Ok(()) => info!("disconnected"),
        Err(e) => error!(error = %e, "disconnect failed"),
    }

    result
}

async fn run(obs: &mut ObsClient, giphy: &Giphy, options: &Options) -> Result<()> {
    let gif = giphy
        .random(&options.tag)
        .await
        .with_context(|| format!("failed to fetch a GIF for '{}'", options.tag))?;
    info!(url = %gif.url, title = %gif.title, "fetched GIF");

    // A failed update is reported but still holds the connection open.
    match update_browser_source(obs, &options.source_name, &gif.url).await {
        Ok(()) => info!(source = %options.source_name, url = %gif.url, "updated browser source"),
        Err(e) => error!(source = %options.source_name, "failed to update source: {e:#}"),
    }

    tokio::time::sleep(options.hold()).await;
    Ok(())
}

async fn update_browser_source(obs: &mut ObsClient, source_name: &str, gif_url: &str) -> Result<()> {
    let mut settings = obs
        .get_input_settings(source_name)
        .await
        .context("reading input settings")?;

    refresh_settings(&mut settings, gif_url, chrono::Utc::now().timestamp_millis());

    obs.set_input_settings(source_name, settings, true)
        .await
        .context("writing input settings")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    const GIF_URL: &str = "https://media.giphy.com/media/xyz/giphy.gif";
    const OLD_CSS: &str = "body { margin: 0; }";

    /// What the obs-websocket side of a run saw.
    #[derive(Debug, Default)]
    struct Seen {
        requests: Vec<Value>,
        closed: bool,
    }

    /// One-connection obs-websocket server without authentication.
    ///
    /// With `missing_input`, GetInputSettings fails the way it does for an
    /// unknown source name.
    async fn spawn_obs(missing_input: bool) -> (u16, JoinHandle<Seen>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let mut seen = Seen::default();
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            let hello = json!({ "op": 0, "d": { "obsWebSocketVersion": "5.5.0", "rpcVersion": 1 } });
            ws.send(Message::Text(hello.to_string())).await.unwrap();

            while let Some(Ok(message)) = ws.next().await {
                let text = match message {
                    Message::Text(text) => text,
                    Message::Close(_) => {
                        seen.closed = true;
                        break;
                    }
                    _ => continue,
                };
                let frame: Value = serde_json::from_str(&text).unwrap();

                match frame["op"].as_u64() {
                    Some(1) => {
                        let identified = json!({ "op": 2, "d": { "negotiatedRpcVersion": 1 } });
                        ws.send(Message::Text(identified.to_string())).await.unwrap();
                    }
                    Some(6) => {
                        let request = frame["d"].clone();
                        let is_get = request["requestType"] == "GetInputSettings";
                        let status = if is_get && missing_input {
                            json!({ "result": false, "code": 600, "comment": "No source was found." })
                        } else {
                            json!({ "result": true, "code": 100 })
                        };
                        let mut d = json!({
                            "requestType": request["requestType"],
                            "requestId": request["requestId"],
                            "requestStatus": status,
                        });
                        if is_get && !missing_input {
                            d["responseData"] = json!({
                                "inputKind": "browser_source",
                                "inputSettings": { "url": "https://old.invalid/a.gif", "css": OLD_CSS }
                            });
                        }
                        let response = json!({ "op": 7, "d": d });
                        ws.send(Message::Text(response.to_string())).await.unwrap();
                        seen.requests.push(request);
                    }
                    _ => {}
                }
            }
            seen
        });

        (port, handle)
    }

    /// One-request HTTP server answering every request with `status` and `body`.
    async fn spawn_giphy(status: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        });

        format!("http://{addr}/v1")
    }

    fn random_gif_body() -> String {
        json!({
            "data": {
                "id": "xyz",
                "title": "Confetti GIF",
                "images": { "original": { "url": GIF_URL } }
            },
            "meta": { "status": 200 }
        })
        .to_string()
    }

    fn options(port: u16) -> Options {
        Options::try_parse_from([
            "gif-drop".to_string(),
            "--giphy-key=test-key".to_string(),
            "--obs-address=127.0.0.1".to_string(),
            format!("--obs-port={port}"),
            "--obs-password=".to_string(),
            "--hold-secs=0".to_string(),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_drop_updates_browser_source() {
        let (port, obs) = spawn_obs(false).await;
        let base_url = spawn_giphy("200 OK", random_gif_body()).await;
        let giphy = Giphy::new("test-key").with_base_url(base_url);

        drop_gif(&options(port), &giphy).await.unwrap();

        let seen = obs.await.unwrap();
        assert!(seen.closed);
        assert_eq!(seen.requests.len(), 2);

        let get = &seen.requests[0];
        assert_eq!(get["requestType"], "GetInputSettings");
        assert_eq!(get["requestData"]["inputName"], "CelebrationGIF");

        let set = &seen.requests[1];
        assert_eq!(set["requestType"], "SetInputSettings");
        assert_eq!(set["requestData"]["inputName"], "CelebrationGIF");
        assert_eq!(set["requestData"]["overlay"], true);

        let settings = &set["requestData"]["inputSettings"];
        assert_eq!(settings["url"], GIF_URL);
        let css = settings["css"].as_str().unwrap();
        let stamp = css
            .strip_prefix(&format!("{OLD_CSS}\n/* trigger update: "))
            .and_then(|rest| rest.strip_suffix(" */"))
            .unwrap_or_else(|| panic!("unexpected css: {css:?}"));
        assert!(stamp.parse::<i64>().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_failed_update_still_completes() {
        let (port, obs) = spawn_obs(true).await;
        let base_url = spawn_giphy("200 OK", random_gif_body()).await;
        let giphy = Giphy::new("test-key").with_base_url(base_url);

        drop_gif(&options(port), &giphy).await.unwrap();

        let seen = obs.await.unwrap();
        assert!(seen.closed);
        assert_eq!(seen.requests.len(), 1);
        assert_eq!(seen.requests[0]["requestType"], "GetInputSettings");
    }

    #[tokio::test]
    async fn test_failed_fetch_still_disconnects() {
        let (port, obs) = spawn_obs(false).await;
        let body = json!({ "meta": { "status": 403, "msg": "Forbidden" } }).to_string();
        let base_url = spawn_giphy("403 Forbidden", body).await;
        let giphy = Giphy::new("bad-key").with_base_url(base_url);

        let err = drop_gif(&options(port), &giphy).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<giphy::Error>(),
            Some(giphy::Error::Api { status: 403, .. })
        ));

        let seen = obs.await.unwrap();
        assert!(seen.closed);
        assert!(seen.requests.is_empty());
    }
}
