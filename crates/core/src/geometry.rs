//! Conversions from caller geometry to engine geometry.
//!
//! Every conversion validates before producing an engine value; nothing
//! out of range ever reaches the engine.

use mk_protocol::{Coordinate, OverlayGeometry, Padding, Point, Region};
use mk_runtime::{CoordinateRegion, CoordinateSpan, DomPoint, EdgePadding, Error, LatLng, OverlayShape, Result};

/// Latitude in [-90, 90], longitude in [-180, 180], both finite.
pub fn to_lat_lng(coordinate: &Coordinate) -> Result<LatLng> {
	let Coordinate { latitude, longitude } = *coordinate;
	if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
		return Err(Error::validation(format!(
			"Invalid latitude: {latitude}. Must be between -90 and 90"
		)));
	}
	if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
		return Err(Error::validation(format!(
			"Invalid longitude: {longitude}. Must be between -180 and 180"
		)));
	}
	Ok(LatLng::new(latitude, longitude))
}

pub fn from_lat_lng(coordinate: LatLng) -> Coordinate {
	Coordinate::new(coordinate.latitude, coordinate.longitude)
}

/// Valid center and strictly positive spans.
pub fn to_region(region: &Region) -> Result<CoordinateRegion> {
	let center = to_lat_lng(&region.center)?;
	let span = region.span;
	if !(span.latitude_delta.is_finite() && span.latitude_delta > 0.0)
		|| !(span.longitude_delta.is_finite() && span.longitude_delta > 0.0)
	{
		return Err(Error::validation(format!(
			"Invalid span: ({}, {}). Deltas must be greater than 0",
			span.latitude_delta, span.longitude_delta
		)));
	}
	Ok(CoordinateRegion {
		center,
		span: CoordinateSpan {
			latitude_delta: span.latitude_delta,
			longitude_delta: span.longitude_delta,
		},
	})
}

/// Each side non-negative; missing sides are zero.
pub fn to_padding(padding: &Padding) -> Result<EdgePadding> {
	let side = |name: &str, value: Option<f64>| -> Result<f64> {
		let value = value.unwrap_or(0.0);
		if !value.is_finite() || value < 0.0 {
			return Err(Error::validation(format!(
				"Invalid padding {name}: {value}. Must be non-negative"
			)));
		}
		Ok(value)
	};
	Ok(EdgePadding {
		top: side("top", padding.top)?,
		right: side("right", padding.right)?,
		bottom: side("bottom", padding.bottom)?,
		left: side("left", padding.left)?,
	})
}

pub fn to_dom_point(point: &Point) -> DomPoint {
	DomPoint::new(point.x, point.y)
}

/// Converts a path, failing on the first invalid vertex.
pub fn to_path(points: &[Coordinate]) -> Result<Vec<LatLng>> {
	points.iter().map(to_lat_lng).collect()
}

/// Converts overlay geometry. Circle radii are meters and must be finite and
/// non-negative; every ring of a polygon is checked.
pub fn to_shape(geometry: &OverlayGeometry) -> Result<OverlayShape> {
	match geometry {
		OverlayGeometry::Circle { center, radius } => {
			let center = to_lat_lng(center)?;
			if !radius.is_finite() || *radius < 0.0 {
				return Err(Error::validation(format!(
					"Invalid radius: {radius}. Must be a non-negative number of meters"
				)));
			}
			Ok(OverlayShape::Circle {
				center,
				radius: *radius,
			})
		}
		OverlayGeometry::Polyline { points } => Ok(OverlayShape::Polyline(to_path(points)?)),
		OverlayGeometry::Polygon { points } => Ok(OverlayShape::Polygon(
			points.rings().into_iter().map(to_path).collect::<Result<_>>()?,
		)),
	}
}

#[cfg(test)]
mod tests {
	use mk_protocol::{PolygonPoints, Span};
	use mk_runtime::ErrorCode;

	use super::*;

	#[test]
	fn test_coordinate_bounds_are_inclusive() {
		assert!(to_lat_lng(&Coordinate::new(90.0, 180.0)).is_ok());
		assert!(to_lat_lng(&Coordinate::new(-90.0, -180.0)).is_ok());
		assert_eq!(
			to_lat_lng(&Coordinate::new(90.5, 0.0)).unwrap_err().code(),
			ErrorCode::ValidationError
		);
		assert!(to_lat_lng(&Coordinate::new(0.0, 180.01)).is_err());
		assert!(to_lat_lng(&Coordinate::new(f64::NAN, 0.0)).is_err());
	}

	#[test]
	fn test_region_requires_positive_span() {
		let center = Coordinate::new(35.0, 139.0);
		assert!(to_region(&Region::new(center, Span::new(0.1, 0.1))).is_ok());
		assert!(to_region(&Region::new(center, Span::new(0.0, 0.1))).is_err());
		assert!(to_region(&Region::new(center, Span::new(0.1, -1.0))).is_err());
		assert!(to_region(&Region::new(Coordinate::new(100.0, 0.0), Span::new(1.0, 1.0))).is_err());
	}

	#[test]
	fn test_padding_defaults_missing_sides_and_rejects_negative() {
		let padding = to_padding(&Padding {
			top: Some(10.0),
			..Padding::default()
		})
		.unwrap();
		assert_eq!(
			padding,
			EdgePadding {
				top: 10.0,
				right: 0.0,
				bottom: 0.0,
				left: 0.0
			}
		);

		let err = to_padding(&Padding {
			left: Some(-1.0),
			..Padding::default()
		})
		.unwrap_err();
		assert!(err.message().contains("left"));
	}

	#[test]
	fn test_shape_checks_radius_and_every_ring() {
		let center = Coordinate::new(1.0, 1.0);
		assert!(to_shape(&OverlayGeometry::Circle { center, radius: 0.0 }).is_ok());
		let err = to_shape(&OverlayGeometry::Circle { center, radius: -5.0 }).unwrap_err();
		assert_eq!(err.message(), "Invalid radius: -5. Must be a non-negative number of meters");

		let outer = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0), Coordinate::new(1.0, 1.0)];
		let hole = vec![Coordinate::new(0.2, 0.2), Coordinate::new(95.0, 0.3)];
		let shape = to_shape(&OverlayGeometry::Polygon {
			points: PolygonPoints::Rings(vec![outer.clone()]),
		})
		.unwrap();
		assert!(matches!(shape, OverlayShape::Polygon(rings) if rings.len() == 1 && rings[0].len() == 3));
		assert!(
			to_shape(&OverlayGeometry::Polygon {
				points: PolygonPoints::Rings(vec![outer, hole]),
			})
			.is_err()
		);
	}
}
