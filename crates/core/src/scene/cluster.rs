use std::sync::Arc;

use mk_protocol::{AnnotationOptions, MarkerStyle};
use mk_runtime::{AnnotationInit, ClusterAnnotation, ClusterFactory, Engine};

use super::ErrorSink;

/// Cluster representative: a marker titled with the member count and showing
/// it as glyph text.
pub fn count_marker_factory(engine: Arc<dyn Engine>, errors: ErrorSink) -> ClusterFactory {
	Arc::new(move |cluster: &ClusterAnnotation| {
		let count = cluster.members.len().to_string();
		let style = MarkerStyle {
			glyph_text: Some(count.clone()),
			..MarkerStyle::default()
		};
		let options = AnnotationOptions {
			title: Some(count),
			clustering_identifier: cluster.clustering_identifier.clone(),
			..AnnotationOptions::default()
		};
		match engine.create_annotation(AnnotationInit::marker(cluster.coordinate, style, options)) {
			Ok(annotation) => Some(annotation),
			Err(err) => {
				errors(&err.scoped("cluster annotation"));
				None
			}
		}
	})
}
