//! Model handle backed by a resident inference server.
//!
//! The server keeps the checkpoint in memory and speaks line-delimited JSON
//! over a Unix socket: one request line per connection, one reply line back.
//!
//! # Protocol
//!
//! **Load** (sent once, when the handle is created):
//! ```json
//! {"command": "load", "model": "facebook/musicgen-small"}
//! ```
//! → `{"ok": true, "sample_rate": 32000}`
//!
//! **Generate**:
//! ```json
//! {"command": "generate", "model": "facebook/musicgen-small",
//!  "description": "calm piano melody", "duration_s": 5,
//!  "use_sampling": true, "top_k": 250}
//! ```
//! → `{"ok": true, "path": "/tmp/clip.wav"}`
//!
//! **Any failure**: `{"ok": false, "error": "..."}`

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{GenerationSettings, ModelLoader, MusicModel};
use crate::audio::read_wav;
use crate::config::SAMPLE_RATE;
use crate::waveform::Waveform;
use crate::{Error, Result};

#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Request<'a> {
    Load {
        model: &'a str,
    },
    Generate {
        model: &'a str,
        description: &'a str,
        duration_s: u32,
        use_sampling: bool,
        top_k: usize,
    },
}

#[derive(Debug, Deserialize)]
struct Reply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    sample_rate: Option<u32>,
}

/// Connects to the inference server and asks it to load a checkpoint.
#[derive(Debug, Clone)]
pub struct DaemonLoader {
    socket: PathBuf,
    timeout: Duration,
}

impl DaemonLoader {
    pub fn new(socket: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket: socket.into(),
            timeout,
        }
    }
}

impl ModelLoader for DaemonLoader {
    fn load_pretrained(&self, model_id: &str) -> Result<Box<dyn MusicModel>> {
        tracing::info!(model = model_id, socket = ?self.socket, "loading pretrained model");
        let reply = roundtrip(&self.socket, self.timeout, &Request::Load { model: model_id })?;
        let sample_rate = reply.sample_rate.unwrap_or(SAMPLE_RATE);
        tracing::info!(model = model_id, sample_rate, "model ready");
        Ok(Box::new(DaemonModel {
            socket: self.socket.clone(),
            timeout: self.timeout,
            model_id: model_id.to_string(),
            sample_rate,
            settings: None,
        }))
    }
}

/// Handle to a checkpoint resident in the inference server.
#[derive(Debug)]
pub struct DaemonModel {
    socket: PathBuf,
    timeout: Duration,
    model_id: String,
    sample_rate: u32,
    settings: Option<GenerationSettings>,
}

impl MusicModel for DaemonModel {
    fn configure(&mut self, settings: &GenerationSettings) -> Result<()> {
        self.settings = Some(*settings);
        Ok(())
    }

    fn generate_one(&mut self, description: &str) -> Result<Waveform> {
        let settings = self
            .settings
            .ok_or_else(|| Error::Model("generate called before configure".into()))?;

        let request = Request::Generate {
            model: &self.model_id,
            description,
            duration_s: settings.duration_s,
            use_sampling: settings.use_sampling,
            top_k: settings.top_k,
        };
        let reply = roundtrip(&self.socket, self.timeout, &request)?;
        let path = reply
            .path
            .ok_or_else(|| Error::Backend("reply is missing 'path'".into()))?;

        let (samples, sample_rate, channels) = read_wav(&path)?;
        if sample_rate != self.sample_rate {
            tracing::warn!(
                expected = self.sample_rate,
                got = sample_rate,
                "backend returned audio at an unexpected sample rate"
            );
        }
        Waveform::from_interleaved(&samples, channels, sample_rate)
    }
}

/// Send one request line and wait for one reply line.
fn roundtrip(socket: &Path, timeout: Duration, request: &Request<'_>) -> Result<Reply> {
    let mut stream = UnixStream::connect(socket)
        .map_err(|e| Error::Backend(format!("failed to connect to {}: {e}", socket.display())))?;
    stream.set_read_timeout(Some(timeout))?;

    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    stream.write_all(line.as_bytes())?;
    stream.flush()?;
    // EOF tells the server the request is complete.
    stream.shutdown(std::net::Shutdown::Write)?;

    let mut response_line = String::new();
    BufReader::new(stream).read_line(&mut response_line)?;
    if response_line.trim().is_empty() {
        return Err(Error::Backend(
            "server closed connection without a reply".into(),
        ));
    }

    let reply: Reply = serde_json::from_str(response_line.trim())?;
    if !reply.ok {
        return Err(Error::Backend(
            reply
                .error
                .unwrap_or_else(|| "server returned ok=false without error".into()),
        ));
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_value(Request::Generate {
            model: "facebook/musicgen-small",
            description: "lofi",
            duration_s: 5,
            use_sampling: true,
            top_k: 250,
        })
        .unwrap();
        assert_eq!(json["command"], "generate");
        assert_eq!(json["duration_s"], 5);
        assert_eq!(json["top_k"], 250);

        let json = serde_json::to_value(Request::Load { model: "m" }).unwrap();
        assert_eq!(json, serde_json::json!({"command": "load", "model": "m"}));
    }

    #[test]
    fn test_error_reply_parses() {
        let reply: Reply = serde_json::from_str(r#"{"ok":false,"error":"oom"}"#).unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.error.as_deref(), Some("oom"));
        assert!(reply.path.is_none());
    }

    #[test]
    fn test_connect_failure_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DaemonLoader::new(dir.path().join("absent.sock"), Duration::from_secs(1));
        let err = loader.load_pretrained("facebook/musicgen-small").err().unwrap();
        assert!(matches!(err, Error::Backend(_)));
    }

    #[test]
    fn test_generate_before_configure_fails() {
        let mut model = DaemonModel {
            socket: PathBuf::from("/nonexistent.sock"),
            timeout: Duration::from_secs(1),
            model_id: "m".into(),
            sample_rate: 32000,
            settings: None,
        };
        assert!(matches!(model.generate_one("x"), Err(Error::Model(_))));
    }
}
