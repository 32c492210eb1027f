use super::middleware::clientip::ClientIp;
use super::tts::{health, synthesize};
use super::TtsRequest;
use crate::app::{AppState, AppStateBuilder};
use crate::config::{Config, SynthesisConfig};
use crate::synthesis::{EngineOutput, SynthesisEngine};
use anyhow::Result;
use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::Response, Json};
use dotenv::dotenv;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpListener;

struct StubEngine {
    calls: AtomicUsize,
    last_model: Mutex<Option<PathBuf>>,
    fail_with: Option<&'static str>,
}

impl StubEngine {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_model: Mutex::new(None),
            fail_with: None,
        })
    }

    fn failing(stderr: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_model: Mutex::new(None),
            fail_with: Some(stderr),
        })
    }
}

#[async_trait]
impl SynthesisEngine for StubEngine {
    async fn run(
        &self,
        text: &str,
        model_path: &Path,
        output_path: &Path,
        _speaker: u32,
    ) -> std::io::Result<EngineOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_model.lock().unwrap() = Some(model_path.to_path_buf());
        if let Some(stderr) = self.fail_with {
            return Ok(EngineOutput {
                success: false,
                stderr: stderr.as_bytes().to_vec(),
            });
        }
        tokio::fs::write(output_path, test_wav(text)).await?;
        Ok(EngineOutput {
            success: true,
            stderr: Vec::new(),
        })
    }
}

fn test_wav(text: &str) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for b in text.bytes() {
            writer.write_sample(b as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn test_state(engine: Arc<StubEngine>, scratch: &TempDir) -> AppState {
    let config = Config {
        http_addr: "127.0.0.1:0".to_string(),
        log_level: None,
        log_file: None,
        synthesis: Some(SynthesisConfig {
            scratch_dir: Some(scratch.path().to_string_lossy().to_string()),
            models_dir: scratch.path().to_string_lossy().to_string(),
            ..Default::default()
        }),
    };
    AppStateBuilder::new()
        .config(config)
        .engine(engine)
        .build()
        .unwrap()
}

async fn response_to_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_synthesize_returns_wav_bytes() -> Result<()> {
    let scratch = TempDir::new()?;
    let engine = StubEngine::ok();
    let state = test_state(engine.clone(), &scratch);

    let params = TtsRequest {
        text: "good morning".to_string(),
        voice: None,
        speaker: None,
    };
    let response = synthesize(ClientIp::new("test".to_string()), State(state), Json(params)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "audio/wav"
    );
    let body = response_to_bytes(response).await;
    assert_eq!(body, test_wav("good morning"));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    // no scratch file survives the request
    assert_eq!(std::fs::read_dir(scratch.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_default_voice_is_applied() -> Result<()> {
    let scratch = TempDir::new()?;
    let engine = StubEngine::ok();
    let state = test_state(engine.clone(), &scratch);

    let params = TtsRequest {
        text: "hello".to_string(),
        voice: None,
        speaker: None,
    };
    let response =
        synthesize(ClientIp::new("test".to_string()), State(state), Json(params)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let model = engine.last_model.lock().unwrap().clone().unwrap();
    assert!(model.ends_with("en_US-amy-medium.onnx"));
    Ok(())
}

#[tokio::test]
async fn test_empty_text_is_rejected_without_invocation() -> Result<()> {
    let scratch = TempDir::new()?;
    let engine = StubEngine::ok();
    let state = test_state(engine.clone(), &scratch);

    let params = TtsRequest {
        text: "   ".to_string(),
        voice: None,
        speaker: None,
    };
    let response = synthesize(ClientIp::new("test".to_string()), State(state), Json(params)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&response_to_bytes(response).await)?;
    assert!(body["detail"].as_str().unwrap().contains("empty"));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_engine_failure_maps_to_internal_error() -> Result<()> {
    let scratch = TempDir::new()?;
    let engine = StubEngine::failing("unable to load /app/models/nope.onnx");
    let state = test_state(engine.clone(), &scratch);

    let params = TtsRequest {
        text: "hello".to_string(),
        voice: Some("nope".to_string()),
        speaker: None,
    };
    let response = synthesize(ClientIp::new("test".to_string()), State(state), Json(params)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_slice(&response_to_bytes(response).await)?;
    assert_eq!(
        body["detail"],
        "TTS failed: unable to load /app/models/nope.onnx"
    );
    assert_eq!(std::fs::read_dir(scratch.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_health_reports_healthy() -> Result<()> {
    let response = health().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&response_to_bytes(response).await)?;
    assert_eq!(body, serde_json::json!({"status": "healthy"}));
    Ok(())
}

#[tokio::test]
async fn test_http_surface_end_to_end() -> Result<()> {
    dotenv().ok();
    let scratch = TempDir::new()?;
    let engine = StubEngine::ok();
    let state = test_state(engine.clone(), &scratch);

    let app = crate::app::create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await
        .ok();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    // liveness probe never touches the engine
    let resp = client.get(format!("{}/health", base)).send().await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json::<serde_json::Value>().await?,
        serde_json::json!({"status": "healthy"})
    );
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);

    // a body without `text` is rejected before any invocation
    let resp = client
        .post(format!("{}/api/tts", base))
        .header("content-type", "application/json")
        .body("{\"voice\": \"en_US-amy-medium\"}")
        .send()
        .await?;
    assert!(resp.status().is_client_error());
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);

    // a valid request returns the waveform unmodified
    let resp = client
        .post(format!("{}/api/tts", base))
        .json(&serde_json::json!({"text": "hello over the wire"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "audio/wav");
    let body = resp.bytes().await?;
    assert_eq!(body.as_ref(), test_wav("hello over the wire"));
    Ok(())
}
