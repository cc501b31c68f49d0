use serde_json::json;

use super::*;
use crate::content::parse_dimension;

#[test]
fn test_marker_spec_from_flat_json() {
	let spec: AnnotationSpec = serde_json::from_value(json!({
		"id": "a",
		"kind": "marker",
		"coordinate": { "latitude": 35.18, "longitude": 136.90 },
		"glyphText": "N",
		"options": { "title": "Nagoya", "displayPriority": 1000 }
	}))
	.unwrap();

	assert_eq!(spec.id.as_deref(), Some("a"));
	assert_eq!(spec.coordinate, Coordinate::new(35.18, 136.90));
	match &spec.kind {
		AnnotationKind::Marker(style) => assert_eq!(style.glyph_text.as_deref(), Some("N")),
		other => panic!("expected marker, got {other:?}"),
	}
	assert_eq!(spec.options.title.as_deref(), Some("Nagoya"));
	assert_eq!(spec.options.display_priority, Some(DisplayPriority::REQUIRED));
}

#[test]
fn test_custom_spec_carries_content() {
	let spec: AnnotationSpec = serde_json::from_value(json!({
		"kind": "custom",
		"coordinate": { "latitude": 0.0, "longitude": 0.0 },
		"content": {
			"type": "element",
			"tag": "div",
			"style": { "width": "40px" },
			"children": [{ "type": "text", "text": "hi" }]
		}
	}))
	.unwrap();

	let AnnotationKind::Custom { content } = &spec.kind else {
		panic!("expected custom kind");
	};
	let ContentNode::Element(element) = content else {
		panic!("expected element content");
	};
	assert_eq!(element.tag, "div");
	assert_eq!(element.style_dimension("width"), Some(40.0));
	assert_eq!(element.children, vec![ContentNode::text("hi")]);
}

#[test]
fn test_polygon_accepts_single_ring_and_multiple_rings() {
	let single: OverlaySpec = serde_json::from_value(json!({
		"kind": "polygon",
		"points": [
			{ "latitude": 0.0, "longitude": 0.0 },
			{ "latitude": 1.0, "longitude": 0.0 },
			{ "latitude": 1.0, "longitude": 1.0 }
		]
	}))
	.unwrap();
	let OverlayGeometry::Polygon { points } = &single.geometry else {
		panic!("expected polygon");
	};
	assert_eq!(points.rings().len(), 1);

	let holed: OverlaySpec = serde_json::from_value(json!({
		"kind": "polygon",
		"points": [
			[{ "latitude": 0.0, "longitude": 0.0 }, { "latitude": 4.0, "longitude": 0.0 }, { "latitude": 4.0, "longitude": 4.0 }],
			[{ "latitude": 1.0, "longitude": 1.0 }, { "latitude": 2.0, "longitude": 1.0 }, { "latitude": 2.0, "longitude": 2.0 }]
		],
		"style": { "fillColor": "#f00", "fillOpacity": 0.25 }
	}))
	.unwrap();
	let OverlayGeometry::Polygon { points } = &holed.geometry else {
		panic!("expected polygon");
	};
	assert_eq!(points.rings().len(), 2);
	assert_eq!(holed.style.fill_opacity, Some(0.25));
}

#[test]
fn test_session_options_fill_defaults_from_partial_input() {
	let options: SessionOptions = serde_json::from_value(json!({ "language": "ja", "libraries": ["map"] })).unwrap();

	assert_eq!(options.language, "ja");
	assert_eq!(options.version, "5.x.x");
	assert_eq!(options.libraries, vec!["map".to_string()]);
	assert_eq!(options.token_fetch_retries, 3);
	assert_eq!(options.token_fetch_retry_delay, 2000);
}

#[test]
fn test_map_options_defaults_do_not_override_caller_values() {
	let options = MapOptions {
		is_scroll_enabled: Some(false),
		..MapOptions::default()
	}
	.with_defaults();

	assert_eq!(options.is_scroll_enabled, Some(false));
	assert_eq!(options.shows_user_location, Some(true));
	assert_eq!(options.shows_compass, Some(FeatureVisibility::Adaptive));
	assert_eq!(options.shows_zoom_control, Some(true));
}

#[test]
fn test_scene_document_items() {
	let doc: SceneDocument = serde_json::from_value(json!({
		"items": [
			{ "annotation": { "kind": "marker", "coordinate": { "latitude": 1.0, "longitude": 2.0 } } },
			{ "overlay": { "kind": "circle", "center": { "latitude": 1.0, "longitude": 2.0 }, "radius": 500.0 } }
		],
		"region": {
			"center": { "latitude": 1.0, "longitude": 2.0 },
			"span": { "latitudeDelta": 0.5, "longitudeDelta": 0.5 }
		}
	}))
	.unwrap();

	assert_eq!(doc.items.len(), 2);
	assert!(matches!(doc.items[1], SceneItemSpec::Overlay(_)));
	assert_eq!(doc.region.map(|r| r.span.latitude_delta), Some(0.5));
	assert!(doc.location.is_none());
}

#[test]
fn test_parse_dimension() {
	assert_eq!(parse_dimension("120px"), Some(120.0));
	assert_eq!(parse_dimension(" 12.5 "), Some(12.5));
	assert_eq!(parse_dimension("auto"), None);
	assert_eq!(parse_dimension(""), None);
}
