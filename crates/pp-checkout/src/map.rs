use std::{collections::HashMap, rc::Rc};

use derive_builder::Builder;

use crate::{
    constants::*,
    location::{LatLng, LocationId, PickupLocation},
    options::Options,
    page::CheckoutPage,
};

/// What the browser reports about the device rendering the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Device {
    pub mobile: bool,
    pub retina: bool,
}

/// Interaction options the map is created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapOptions {
    pub dragging: bool,
    pub touch_zoom: bool,
}

impl MapOptions {
    /// One-finger dragging fights page scrolling on touch devices, so it is off there.
    pub fn for_device(device: Device) -> Self {
        Self {
            dragging: !device.mobile,
            touch_zoom: true,
        }
    }
}

/// Raster tile source drawn under the markers.
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct TileLayer {
    #[builder(setter(into))]
    pub url_format: String,
    #[builder(setter(into))]
    pub attribution: String,
    #[builder(setter(into))]
    pub subdomains: String,
    pub max_zoom: u8,
    #[builder(setter(into))]
    pub id: String,
    pub retina: bool,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_format: DEFAULT_TILE_URL_FORMAT.to_string(),
            attribution: DEFAULT_TILE_ATTRIBUTION.to_string(),
            subdomains: DEFAULT_TILE_SUBDOMAINS.to_string(),
            max_zoom: DEFAULT_TILE_MAX_ZOOM,
            id: DEFAULT_TILE_LAYER_ID.to_string(),
            retina: false,
        }
    }
}

impl TileLayer {
    /// Tile URL template, asking for double-density tiles on retina screens.
    pub fn url_template(&self) -> String {
        let suffix = if self.retina { "@2x.png" } else { ".png" };
        format!("{}{}", self.url_format, suffix)
    }
}

/// A live map instance.
pub trait MapSurface {
    type Marker;

    fn add_tile_layer(&mut self, layer: &TileLayer);
    fn set_attribution_prefix(&mut self, prefix: &str);
    fn disable_scroll_wheel_zoom(&mut self);
    /// Place a marker with a popup showing `popup`. Clicks on it must be
    /// reported back as marker clicks carrying `id`.
    fn place_marker(&mut self, position: LatLng, id: &LocationId, popup: &str) -> Self::Marker;
    fn remove_marker(&mut self, marker: Self::Marker);
    fn fit_bounds(&mut self, bounds: &[LatLng]);
    fn set_zoom(&mut self, level: u8);
    fn open_popup(&mut self, marker: &Self::Marker);
}

/// Mapping library able to create map instances.
pub trait MapBackend {
    type Surface: MapSurface;

    fn device(&self) -> Device;
    fn create(&mut self, element_id: &str, options: MapOptions) -> Self::Surface;
}

enum MapState<S: MapSurface> {
    Detached,
    Active {
        surface: S,
        markers: HashMap<LocationId, S::Marker>,
    },
}

/// Owns the map and keeps markers, list inputs and detail panels in step.
///
/// Without a configured map element every map operation is a no-op, while
/// list selection and detail panels keep working.
pub struct MapController<B: MapBackend, P> {
    backend: B,
    page: Rc<P>,
    settings: Options,
    tile_layer: TileLayer,
    state: MapState<B::Surface>,
}

impl<B: MapBackend, P: CheckoutPage> MapController<B, P> {
    pub fn new(backend: B, page: Rc<P>) -> Self {
        Self {
            backend,
            page,
            settings: Options::new(),
            tile_layer: TileLayer::default(),
            state: MapState::Detached,
        }
    }

    pub fn configure(&mut self, options: Options) {
        self.settings.merge(options);
    }

    pub fn settings(&self) -> &Options {
        &self.settings
    }

    pub fn set_tile_layer(&mut self, layer: TileLayer) {
        self.tile_layer = layer;
    }

    /// Create the map in the configured element. Runs once; later calls do nothing.
    pub fn initialize(&mut self) {
        if self.is_active() {
            return;
        }
        let Some(element_id) = self.settings.map_id().map(str::to_owned) else {
            tracing::debug!("no map element configured, map stays detached");
            return;
        };

        let device = self.backend.device();
        let mut surface = self
            .backend
            .create(&element_id, MapOptions::for_device(device));
        surface.add_tile_layer(&TileLayer {
            retina: device.retina,
            ..self.tile_layer.clone()
        });
        surface.set_attribution_prefix("");
        surface.disable_scroll_wheel_zoom();
        tracing::debug!(%element_id, ?device, "pickup map created");

        self.state = MapState::Active {
            surface,
            markers: HashMap::new(),
        };
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, MapState::Active { .. })
    }

    /// Replace the markers with one per present location and frame them.
    pub fn set_locations(&mut self, locations: &[Option<PickupLocation>]) {
        let MapState::Active { surface, markers } = &mut self.state else {
            return;
        };
        for (_, marker) in markers.drain() {
            surface.remove_marker(marker);
        }

        let mut bounds = Vec::with_capacity(locations.len());
        for location in locations.iter().flatten() {
            let marker = surface.place_marker(location.position, &location.id, &location.label);
            if let Some(previous) = markers.insert(location.id.clone(), marker) {
                surface.remove_marker(previous);
            }
            bounds.push(location.position);
        }

        if !bounds.is_empty() {
            surface.fit_bounds(&bounds);
        }
        // Fitting a single point zooms all the way in.
        if bounds.len() == 1 {
            surface.set_zoom(SINGLE_LOCATION_ZOOM);
        }
        tracing::debug!(placed = bounds.len(), "pickup markers placed");
    }

    /// Remove every marker, leaving the map itself in place.
    pub fn clear_markers(&mut self) {
        if let MapState::Active { surface, markers } = &mut self.state {
            for (_, marker) in markers.drain() {
                surface.remove_marker(marker);
            }
        }
    }

    pub fn marker_ids(&self) -> Vec<LocationId> {
        match &self.state {
            MapState::Detached => Vec::new(),
            MapState::Active { markers, .. } => {
                let mut ids: Vec<_> = markers.keys().cloned().collect();
                ids.sort();
                ids
            }
        }
    }

    /// Marker to list: check the list input for `id` and show its details.
    pub fn select(&self, id: &LocationId) -> bool {
        if !self.page.check_input(id) {
            tracing::debug!(%id, "no list input for selected marker");
            return false;
        }
        self.reveal_additional(id);
        true
    }

    /// List to marker: open the popup of `id` and show its details.
    pub fn update(&mut self, id: &LocationId) {
        if let MapState::Active { surface, markers } = &mut self.state {
            if let Some(marker) = markers.get(id) {
                surface.open_popup(marker);
            }
        }
        self.reveal_additional(id);
    }

    /// Hide every detail panel, then show the one belonging to `id` if it exists.
    pub fn reveal_additional(&self, id: &LocationId) -> bool {
        self.page.hide_additional_panels();
        self.page.show_additional_panel(&id.additional_panel_id())
    }
}
