//! In-process stand-in for the prediction backend.
//!
//! Serves canned JSON for the six endpoints over a real socket so the
//! reqwest client, status handling and schema checks all run for real.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use mldemo::api::HttpApi;
use mldemo::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Every endpoint answers 503 with an `error` body.
    Unavailable,
    /// Every endpoint answers 200 with a body that is not JSON.
    Malformed,
}

pub const FEATURES: [&str; 7] = [
    "mean radius",
    "mean texture",
    "mean perimeter",
    "mean area",
    "mean smoothness",
    "worst area",
    "flat feature",
];

pub const TOP_FEATURES: [&str; 4] = ["worst area", "mean perimeter", "mean radius", "mean area"];

pub struct MockBackend {
    pub base: String,
    mode: Mutex<Mode>,
    hits: Mutex<HashMap<String, usize>>,
    bodies: Mutex<Vec<Value>>,
}

impl MockBackend {
    pub async fn start() -> Arc<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let backend = Arc::new(Self {
            base: format!("http://{}/api", addr),
            mode: Mutex::new(Mode::Normal),
            hits: Mutex::new(HashMap::new()),
            bodies: Mutex::new(Vec::new()),
        });
        let server = Arc::clone(&backend);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { break };
                let server = Arc::clone(&server);
                tokio::spawn(async move {
                    let _ = server.serve(stream).await;
                });
            }
        });
        backend
    }

    pub fn api(&self) -> HttpApi {
        HttpApi::new(&Config::with_api_url(self.base.clone())).unwrap()
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Requests received for `path` (e.g. `"/api/predict"`).
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// JSON bodies of every POST, in arrival order.
    pub fn posted(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    async fn serve(&self, mut stream: TcpStream) -> std::io::Result<()> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = &buf[header_end..];

        let mut parts = head.lines().next().unwrap_or("").split_whitespace();
        let method = parts.next().unwrap_or("").to_string();
        let path = parts.next().unwrap_or("").to_string();
        *self.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

        let (status, payload) = self.route(&method, &path, body);
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            payload.len(),
            payload
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await
    }

    fn route(&self, method: &str, path: &str, body: &[u8]) -> (&'static str, String) {
        match *self.mode.lock().unwrap() {
            Mode::Unavailable => {
                let body = json!({"error": "Models not loaded"});
                return ("503 SERVICE UNAVAILABLE", body.to_string());
            }
            Mode::Malformed => return ("200 OK", "{\"n_samples\": ".to_string()),
            Mode::Normal => {}
        }
        let request: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        if method == "POST" {
            self.bodies.lock().unwrap().push(request.clone());
        }
        match (method, path) {
            ("GET", "/api/health") => {
                ("200 OK", json!({"status": "healthy", "message": "API is running"}).to_string())
            }
            ("GET", "/api/metadata") => ("200 OK", metadata().to_string()),
            ("GET", "/api/feature-stats") => ("200 OK", feature_stats().to_string()),
            ("GET", "/api/dataset") => ("200 OK", dataset().to_string()),
            ("POST", "/api/predict") => {
                let model = request["model"].as_str().unwrap_or("");
                match prediction(model, &request["features"]) {
                    Some(p) => ("200 OK", p.to_string()),
                    None => {
                        let body = json!({"error": format!("Model {} not found", model)});
                        ("400 BAD REQUEST", body.to_string())
                    }
                }
            }
            ("POST", "/api/predict-all") => {
                let mut all = serde_json::Map::new();
                for model in ["logistic_regression", "random_forest", "gradient_boosting"] {
                    if let Some(p) = prediction(model, &request["features"]) {
                        all.insert(model.to_string(), p);
                    }
                }
                ("200 OK", Value::Object(all).to_string())
            }
            _ => ("404 NOT FOUND", json!({"error": "Not found"}).to_string()),
        }
    }
}

pub fn metadata() -> Value {
    json!({
        "n_samples": 569,
        "n_features": FEATURES.len(),
        "feature_names": FEATURES,
        "target_names": ["malignant", "benign"],
        "class_distribution": {"benign": 357, "malignant": 212},
        "top_features": TOP_FEATURES,
    })
}

pub fn feature_stats() -> Value {
    json!({
        "mean radius": {"min": 6.981, "max": 28.11, "mean": 14.127, "std": 3.524},
        "mean texture": {"min": 9.71, "max": 39.28, "mean": 19.29, "std": 4.301},
        "mean perimeter": {"min": 43.79, "max": 188.5, "mean": 91.97, "std": 24.3},
        "mean area": {"min": 143.5, "max": 2501.0, "mean": 654.89, "std": 351.91},
        "mean smoothness": {"min": 0.05263, "max": 0.1634, "mean": 0.09636, "std": 0.01406},
        "worst area": {"min": 185.2, "max": 4254.0, "mean": 880.58, "std": 569.36},
        "flat feature": {"min": 1.0, "max": 1.0, "mean": 1.0, "std": 0.0},
    })
}

/// Twelve rows, target appended as the trailing column the way the backend sends it.
pub fn dataset() -> Value {
    let rows: Vec<(Vec<f64>, u8)> = vec![
        (vec![17.99, 10.38, 122.8, 1001.0, 0.1184, 2019.0, 1.0], 0),
        (vec![20.57, 17.77, 132.9, 1326.0, 0.08474, 1956.0, 1.0], 0),
        (vec![19.69, 21.25, 130.0, 1203.0, 0.1096, 1709.0, 1.0], 0),
        (vec![11.42, 20.38, 77.58, 386.1, 0.1425, 567.7, 1.0], 0),
        (vec![20.29, 14.34, 135.1, 1297.0, 0.1003, 1575.0, 1.0], 0),
        (vec![13.54, 14.36, 87.46, 566.3, 0.09779, 711.2, 1.0], 1),
        (vec![13.08, 15.71, 85.63, 520.0, 0.1075, 630.5, 1.0], 1),
        (vec![9.504, 12.44, 60.34, 273.9, 0.1024, 314.9, 1.0], 1),
        (vec![13.03, 18.42, 82.61, 523.8, 0.08983, 545.9, 1.0], 1),
        (vec![8.196, 16.84, 51.71, 201.9, 0.086, 242.2, 1.0], 1),
        (vec![12.05, 14.63, 78.04, 449.3, 0.1031, 527.2, 1.0], 1),
        (vec![6.981, 13.43, 43.79, 143.5, 0.117, 185.2, 1.0], 1),
    ];
    let data: Vec<Vec<f64>> = rows
        .iter()
        .map(|(r, t)| {
            let mut row = r.clone();
            row.push(*t as f64);
            row
        })
        .collect();
    let target: Vec<u8> = rows.iter().map(|(_, t)| *t).collect();
    json!({"features": FEATURES, "data": data, "target": target})
}

/// Benign probability falls as worst area grows; models differ only in weights.
pub fn prediction(model: &str, features: &Value) -> Option<Value> {
    let (importance, skew) = match model {
        "logistic_regression" => (
            json!({
                "worst area": 1.42,
                "mean perimeter": 0.88,
                "mean radius": -0.65,
                "mean area": 0.31
            }),
            0.0,
        ),
        "random_forest" => (
            json!({
                "worst area": 0.21,
                "mean perimeter": 0.12,
                "mean radius": 0.08,
                "mean area": 0.05
            }),
            0.05,
        ),
        "gradient_boosting" => (
            json!({
                "worst area": 0.34,
                "mean perimeter": 0.07,
                "mean radius": 0.02,
                "mean area": 0.01
            }),
            -0.05,
        ),
        _ => return None,
    };
    let area = features["worst area"].as_f64().unwrap_or(880.58);
    let benign: f64 = (1.0 - area / 2000.0 + skew).clamp(0.0, 1.0);
    Some(json!({
        "prediction": if benign >= 0.5 { 1 } else { 0 },
        "probabilities": {"benign": benign, "malignant": 1.0 - benign},
        "feature_importance": importance,
    }))
}

/// Address nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}
