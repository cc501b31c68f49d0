use std::fmt::Write as _;
use std::path::Path;

use mk::geometry::{to_lat_lng, to_padding, to_region, to_shape};
use mk::protocol::SceneItemSpec;
use serde::Serialize;

use super::load_document;
use crate::error::Result;
use crate::output::Render;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateReport {
	pub file: String,
	pub items: usize,
	pub problems: Vec<Problem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
	/// Position in `items`; absent for the viewport.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub index: Option<usize>,
	/// `annotation "a"`, `overlay "overlay-1"`, `location` or `region`.
	pub target: String,
	pub code: String,
	pub message: String,
}

impl Problem {
	fn new(index: Option<usize>, target: String, err: &mk::Error) -> Self {
		Self {
			index,
			target,
			code: err.code().as_str().to_string(),
			message: err.message().to_string(),
		}
	}
}

/// Runs every geometry conversion the reconciler would, without an engine.
/// Ids are resolved the same way, positionally per kind when absent.
pub fn run(path: &Path) -> Result<ValidateReport> {
	let document = load_document(path)?;
	let mut problems = Vec::new();
	let (mut annotations, mut overlays) = (0usize, 0usize);

	for (index, item) in document.items.iter().enumerate() {
		let (target, checked) = match item {
			SceneItemSpec::Annotation(spec) => {
				let id = spec.id.clone().unwrap_or_else(|| format!("annotation-{annotations}"));
				annotations += 1;
				let checked = to_lat_lng(&spec.coordinate)
					.and_then(|_| spec.options.padding.as_ref().map(to_padding).transpose().map(|_| ()));
				(format!("annotation \"{id}\""), checked)
			}
			SceneItemSpec::Overlay(spec) => {
				let id = spec.id.clone().unwrap_or_else(|| format!("overlay-{overlays}"));
				overlays += 1;
				(format!("overlay \"{id}\""), to_shape(&spec.geometry).map(|_| ()))
			}
		};
		if let Err(err) = checked {
			problems.push(Problem::new(Some(index), target, &err));
		}
	}

	if let Some(location) = &document.location {
		if let Err(err) = to_lat_lng(location) {
			problems.push(Problem::new(None, "location".to_string(), &err));
		}
	}
	if let Some(region) = &document.region {
		if let Err(err) = to_region(region) {
			problems.push(Problem::new(None, "region".to_string(), &err));
		}
	}

	tracing::debug!(
		target = "mk.validate",
		file = %path.display(),
		items = document.items.len(),
		problems = problems.len(),
		"document checked"
	);
	Ok(ValidateReport {
		file: path.display().to_string(),
		items: document.items.len(),
		problems,
	})
}

impl Render for ValidateReport {
	fn render(&self, out: &mut String) {
		if self.problems.is_empty() {
			let _ = writeln!(out, "{}: {} item(s), ok", self.file, self.items);
			return;
		}
		let _ = writeln!(out, "{}: {} item(s)", self.file, self.items);
		for problem in &self.problems {
			let _ = writeln!(out, "  {}: {} {}", problem.target, problem.code, problem.message);
		}
	}
}
