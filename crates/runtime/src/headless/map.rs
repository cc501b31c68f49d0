use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use mk_protocol::MapOptions;
use parking_lot::Mutex;

use super::{EngineOp, OpLog};
use crate::engine::{
	ClusterAnnotation, ClusterFactory, CoordinateRegion, CoordinateSpan, DomPoint, EngineAnnotation, EngineMap,
	EngineOverlay, HostContainer, LatLng, ListenerId, MapEvent, MapEventDetail, MapEventKind, MapListener,
	next_listener_id,
};
use crate::error::{Error, Result};

pub struct HeadlessMap {
	handle: u64,
	container: Arc<dyn HostContainer>,
	options: MapOptions,
	log: Arc<OpLog>,
	annotations: Mutex<Vec<Arc<dyn EngineAnnotation>>>,
	overlays: Mutex<Vec<Arc<dyn EngineOverlay>>>,
	region: Mutex<CoordinateRegion>,
	cluster_factory: Mutex<Option<ClusterFactory>>,
	listeners: Mutex<IndexMap<ListenerId, (MapEventKind, MapListener)>>,
	destroyed: AtomicBool,
}

impl HeadlessMap {
	pub(crate) fn new(handle: u64, container: Arc<dyn HostContainer>, options: MapOptions, log: Arc<OpLog>) -> Self {
		let region = options
			.region
			.map(|r| CoordinateRegion {
				center: LatLng::new(r.center.latitude, r.center.longitude),
				span: CoordinateSpan {
					latitude_delta: r.span.latitude_delta,
					longitude_delta: r.span.longitude_delta,
				},
			})
			.unwrap_or(CoordinateRegion::WORLD);

		Self {
			handle,
			container,
			options,
			log,
			annotations: Mutex::new(Vec::new()),
			overlays: Mutex::new(Vec::new()),
			region: Mutex::new(region),
			cluster_factory: Mutex::new(None),
			listeners: Mutex::new(IndexMap::new()),
			destroyed: AtomicBool::new(false),
		}
	}

	pub fn handle(&self) -> u64 {
		self.handle
	}

	pub fn options(&self) -> &MapOptions {
		&self.options
	}

	pub fn is_destroyed(&self) -> bool {
		self.destroyed.load(Ordering::SeqCst)
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.lock().len()
	}

	pub fn has_cluster_factory(&self) -> bool {
		self.cluster_factory.lock().is_some()
	}

	/// Asks the cluster factory for a representative of `members`, placed at
	/// their centroid.
	pub fn cluster(&self, members: Vec<Arc<dyn EngineAnnotation>>) -> Option<Arc<dyn EngineAnnotation>> {
		let factory = self.cluster_factory.lock().clone()?;
		let count = members.len().max(1) as f64;
		let (lat, lng) = members.iter().fold((0.0, 0.0), |(lat, lng), m| {
			let c = m.coordinate();
			(lat + c.latitude, lng + c.longitude)
		});
		let cluster = ClusterAnnotation {
			coordinate: LatLng::new(lat / count, lng / count),
			clustering_identifier: None,
			members,
		};
		factory(&cluster)
	}

	pub fn emit(&self, kind: MapEventKind, detail: MapEventDetail) {
		let event = MapEvent { kind, detail };
		let listeners: Vec<MapListener> = self
			.listeners
			.lock()
			.values()
			.filter(|(k, _)| *k == kind)
			.map(|(_, l)| l.clone())
			.collect();
		for listener in listeners {
			listener(&event);
		}
	}

	fn ensure_live(&self) -> Result<()> {
		if self.is_destroyed() {
			Err(Error::Unknown(format!("map {} has been destroyed", self.handle)))
		} else {
			Ok(())
		}
	}
}

impl EngineMap for HeadlessMap {
	fn add_annotation(&self, annotation: &Arc<dyn EngineAnnotation>) -> Result<()> {
		self.ensure_live()?;
		let mut annotations = self.annotations.lock();
		if annotations.iter().any(|a| Arc::ptr_eq(a, annotation)) {
			return Ok(());
		}
		annotations.push(annotation.clone());
		self.log.push(EngineOp::AddAnnotation {
			map: self.handle,
			handle: annotation.handle_id(),
		});
		Ok(())
	}

	fn remove_annotation(&self, annotation: &Arc<dyn EngineAnnotation>) -> Result<()> {
		self.ensure_live()?;
		let mut annotations = self.annotations.lock();
		let Some(index) = annotations.iter().position(|a| Arc::ptr_eq(a, annotation)) else {
			return Err(Error::Unknown(format!(
				"annotation {} is not on map {}",
				annotation.handle_id(),
				self.handle
			)));
		};
		annotations.remove(index);
		self.log.push(EngineOp::RemoveAnnotation {
			map: self.handle,
			handle: annotation.handle_id(),
		});
		Ok(())
	}

	fn add_overlay(&self, overlay: &Arc<dyn EngineOverlay>) -> Result<()> {
		self.ensure_live()?;
		let mut overlays = self.overlays.lock();
		if overlays.iter().any(|o| Arc::ptr_eq(o, overlay)) {
			return Ok(());
		}
		overlays.push(overlay.clone());
		self.log.push(EngineOp::AddOverlay {
			map: self.handle,
			handle: overlay.handle_id(),
		});
		Ok(())
	}

	fn remove_overlay(&self, overlay: &Arc<dyn EngineOverlay>) -> Result<()> {
		self.ensure_live()?;
		let mut overlays = self.overlays.lock();
		let Some(index) = overlays.iter().position(|o| Arc::ptr_eq(o, overlay)) else {
			return Err(Error::Unknown(format!(
				"overlay {} is not on map {}",
				overlay.handle_id(),
				self.handle
			)));
		};
		overlays.remove(index);
		self.log.push(EngineOp::RemoveOverlay {
			map: self.handle,
			handle: overlay.handle_id(),
		});
		Ok(())
	}

	fn annotations(&self) -> Vec<Arc<dyn EngineAnnotation>> {
		self.annotations.lock().clone()
	}

	fn overlays(&self) -> Vec<Arc<dyn EngineOverlay>> {
		self.overlays.lock().clone()
	}

	fn show_items(&self, annotations: &[Arc<dyn EngineAnnotation>], _animate: bool) -> Result<()> {
		self.ensure_live()?;
		{
			let mut live = self.annotations.lock();
			for annotation in annotations {
				if !live.iter().any(|a| Arc::ptr_eq(a, annotation)) {
					live.push(annotation.clone());
				}
			}
		}
		self.log.push(EngineOp::ShowItems {
			map: self.handle,
			handles: annotations.iter().map(|a| a.handle_id()).collect(),
		});
		if let Some(first) = annotations.first() {
			let mut region = self.region.lock();
			region.center = first.coordinate();
		}
		Ok(())
	}

	fn set_region_animated(&self, region: CoordinateRegion, _animate: bool) -> Result<()> {
		self.ensure_live()?;
		*self.region.lock() = region;
		self.log.push(EngineOp::SetRegion {
			map: self.handle,
			latitude: region.center.latitude,
			longitude: region.center.longitude,
		});
		Ok(())
	}

	fn region(&self) -> CoordinateRegion {
		*self.region.lock()
	}

	/// Linear projection of the current region onto the container, in page
	/// space (container origin plus scroll).
	fn convert_coordinate_to_point_on_page(&self, coordinate: LatLng) -> DomPoint {
		let rect = self.container.bounding_rect();
		let scroll = self.container.scroll_offset();
		let region = self.region();
		let west = region.center.longitude - region.span.longitude_delta / 2.0;
		let north = region.center.latitude + region.span.latitude_delta / 2.0;
		let fx = (coordinate.longitude - west) / region.span.longitude_delta;
		let fy = (north - coordinate.latitude) / region.span.latitude_delta;
		DomPoint::new(rect.x + scroll.x + fx * rect.width, rect.y + scroll.y + fy * rect.height)
	}

	fn set_cluster_factory(&self, factory: Option<ClusterFactory>) {
		*self.cluster_factory.lock() = factory;
	}

	fn add_event_listener(&self, kind: MapEventKind, listener: MapListener) -> ListenerId {
		let id = next_listener_id();
		self.listeners.lock().insert(id, (kind, listener));
		id
	}

	fn remove_event_listener(&self, id: ListenerId) -> bool {
		self.listeners.lock().shift_remove(&id).is_some()
	}

	fn destroy(&self) {
		if self.destroyed.swap(true, Ordering::SeqCst) {
			return;
		}
		self.annotations.lock().clear();
		self.overlays.lock().clear();
		self.listeners.lock().clear();
		self.cluster_factory.lock().take();
		self.log.push(EngineOp::DestroyMap { map: self.handle });
	}
}
