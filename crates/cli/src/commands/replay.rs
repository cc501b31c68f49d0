use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use mk::protocol::{SessionOptions, TokenResponse};
use mk::runtime::headless::{EngineOp, HeadlessContainer, HeadlessEngine};
use mk::runtime::{DomRect, TokenProvider};
use mk::{ErrorSink, MapConfig, MapView, SceneItem, Session, Viewport};
use parking_lot::Mutex;
use serde::Serialize;

use super::load_document;
use crate::error::Result;
use crate::output::{CommandError, Render};

/// Size of the headless host container.
const CONTAINER: (f64, f64) = (800.0, 600.0);

/// Lifetime of the tokens handed to the replay session.
const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
	/// Script injection, engine init and map creation.
	pub mount: Vec<EngineOp>,
	pub passes: Vec<PassReport>,
	pub teardown: Vec<EngineOp>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
	pub file: String,
	pub ops: Vec<EngineOp>,
	pub live: Vec<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<CommandError>,
}

fn static_tokens() -> Arc<dyn TokenProvider> {
	Arc::new(|| async {
		let now = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs() as i64);
		Ok(TokenResponse {
			token: "replay".to_string(),
			expires_at: now + TOKEN_TTL_SECS,
		})
	})
}

pub async fn run(files: &[PathBuf], options: SessionOptions) -> Result<ReplayReport> {
	let documents = files
		.iter()
		.map(|path| load_document(path).map(|doc| (path, doc)))
		.collect::<anyhow::Result<Vec<_>>>()?;

	let engine = Arc::new(HeadlessEngine::new());
	let session = Session::new(options, engine.clone(), engine.clone(), static_tokens());
	let reported: Arc<Mutex<Vec<mk::Error>>> = Arc::new(Mutex::new(Vec::new()));
	let sink: ErrorSink = {
		let reported = reported.clone();
		Arc::new(move |err: &mk::Error| reported.lock().push(err.clone()))
	};

	let container = Arc::new(HeadlessContainer::new(DomRect::new(0.0, 0.0, CONTAINER.0, CONTAINER.1)));
	let view = MapView::mount(&session, container, MapConfig::default(), sink).await?;
	let mount = engine.drain_ops();

	let mut passes = Vec::with_capacity(documents.len());
	for (path, document) in documents {
		let items: Vec<SceneItem> = document.items.into_iter().map(SceneItem::from).collect();
		let live = view.update_scene(&items);

		if document.location.is_some() || document.region.is_some() {
			let viewport = Viewport {
				location: document.location,
				region: document.region,
			};
			if let Err(err) = view.set_viewport(&viewport) {
				tracing::debug!(target = "mk.replay", error = %err, "viewport rejected");
			}
		}

		let errors = std::mem::take(&mut *reported.lock());
		tracing::info!(
			target = "mk.replay",
			file = %path.display(),
			live = live.len(),
			errors = errors.len(),
			"pass applied"
		);
		passes.push(PassReport {
			file: path.display().to_string(),
			ops: engine.drain_ops(),
			live: live.into_iter().map(|entity| entity.id).collect(),
			errors: errors
				.iter()
				.map(|err| CommandError::new(err.code().as_str(), err.message()))
				.collect(),
		});
	}

	drop(view);
	Ok(ReplayReport {
		mount,
		passes,
		teardown: engine.drain_ops(),
	})
}

/// `createAnnotation handle=3 kind="marker"`
fn describe(op: &EngineOp) -> String {
	let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(op) else {
		return format!("{op:?}");
	};
	let mut line = fields.get("op").and_then(|v| v.as_str()).unwrap_or("?").to_string();
	for (key, value) in fields.iter().filter(|(key, _)| key.as_str() != "op") {
		let _ = write!(line, " {key}={value}");
	}
	line
}

impl Render for ReplayReport {
	fn render(&self, out: &mut String) {
		let _ = writeln!(out, "mount: {} op(s)", self.mount.len());
		for (n, pass) in self.passes.iter().enumerate() {
			let _ = writeln!(out, "pass {} ({})", n + 1, pass.file);
			for op in &pass.ops {
				let _ = writeln!(out, "  {}", describe(op));
			}
			let _ = writeln!(out, "  live: [{}]", pass.live.join(", "));
			for error in &pass.errors {
				let _ = writeln!(out, "  {}: {}", error.code, error.message);
			}
		}
		let _ = writeln!(out, "teardown: {} op(s)", self.teardown.len());
	}
}
