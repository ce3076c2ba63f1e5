use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use reqwest::StatusCode;
use tokio::sync::oneshot;

use crate::{
    error::FetchError,
    location::{LatLng, LocationId},
    map::{Device, MapBackend, MapOptions, MapSurface, TileLayer},
    transport::{FetchParams, Transport},
};

pub type Reply = Result<String, FetchError>;

#[derive(Default)]
struct Script {
    replies: VecDeque<oneshot::Receiver<Reply>>,
    requests: Vec<(String, FetchParams)>,
}

/// Transport answering requests, in call order, with replies queued by the test.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Rc<RefCell<Script>>,
}

impl ScriptedTransport {
    pub fn reply_ok(&self, markup: &str) {
        let _ = self.reply_later().send(Ok(markup.to_owned()));
    }

    pub fn reply_status(&self, status: StatusCode) {
        let _ = self.reply_later().send(Err(FetchError::ResponseError(status)));
    }

    /// Queue a reply the test sends once it wants the request to complete.
    pub fn reply_later(&self) -> oneshot::Sender<Reply> {
        let (sender, receiver) = oneshot::channel();
        self.script.borrow_mut().replies.push_back(receiver);
        sender
    }

    pub fn requests(&self) -> Vec<(String, FetchParams)> {
        self.script.borrow().requests.clone()
    }
}

impl Transport for ScriptedTransport {
    async fn post_form(&self, url: &str, params: &FetchParams) -> Result<String, FetchError> {
        let reply = {
            let mut script = self.script.borrow_mut();
            script.requests.push((url.to_owned(), params.clone()));
            script.replies.pop_front()
        };
        match reply {
            Some(reply) => reply
                .await
                .unwrap_or(Err(FetchError::ResponseError(StatusCode::SERVICE_UNAVAILABLE))),
            None => Err(FetchError::ResponseError(StatusCode::SERVICE_UNAVAILABLE)),
        }
    }
}

/// Let spawned local tasks run until they block.
pub async fn run_pending() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MapCall {
    TileLayer(String),
    AttributionPrefix(String),
    DisableScrollWheelZoom,
    PlaceMarker {
        id: LocationId,
        position: LatLng,
        popup: String,
    },
    RemoveMarker(LocationId),
    FitBounds(Vec<LatLng>),
    SetZoom(u8),
    OpenPopup(LocationId),
}

type CallLog = Rc<RefCell<Vec<MapCall>>>;

/// Map backend that records every call made on the maps it creates.
#[derive(Clone)]
pub struct RecordingBackend {
    device: Device,
    created: Rc<RefCell<Vec<(String, MapOptions)>>>,
    calls: CallLog,
}

impl RecordingBackend {
    pub fn new(device: Device) -> Self {
        Self {
            device,
            created: Rc::default(),
            calls: Rc::default(),
        }
    }

    pub fn created(&self) -> Vec<(String, MapOptions)> {
        self.created.borrow().clone()
    }

    pub fn take_calls(&self) -> Vec<MapCall> {
        self.calls.borrow_mut().drain(..).collect()
    }
}

impl MapBackend for RecordingBackend {
    type Surface = RecordingSurface;

    fn device(&self) -> Device {
        self.device
    }

    fn create(&mut self, element_id: &str, options: MapOptions) -> RecordingSurface {
        self.created
            .borrow_mut()
            .push((element_id.to_owned(), options));
        RecordingSurface {
            calls: Rc::clone(&self.calls),
        }
    }
}

pub struct RecordingSurface {
    calls: CallLog,
}

impl RecordingSurface {
    fn record(&self, call: MapCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl MapSurface for RecordingSurface {
    type Marker = LocationId;

    fn add_tile_layer(&mut self, layer: &TileLayer) {
        self.record(MapCall::TileLayer(layer.url_template()));
    }

    fn set_attribution_prefix(&mut self, prefix: &str) {
        self.record(MapCall::AttributionPrefix(prefix.to_owned()));
    }

    fn disable_scroll_wheel_zoom(&mut self) {
        self.record(MapCall::DisableScrollWheelZoom);
    }

    fn place_marker(&mut self, position: LatLng, id: &LocationId, popup: &str) -> LocationId {
        self.record(MapCall::PlaceMarker {
            id: id.clone(),
            position,
            popup: popup.to_owned(),
        });
        id.clone()
    }

    fn remove_marker(&mut self, marker: LocationId) {
        self.record(MapCall::RemoveMarker(marker));
    }

    fn fit_bounds(&mut self, bounds: &[LatLng]) {
        self.record(MapCall::FitBounds(bounds.to_vec()));
    }

    fn set_zoom(&mut self, level: u8) {
        self.record(MapCall::SetZoom(level));
    }

    fn open_popup(&mut self, marker: &LocationId) {
        self.record(MapCall::OpenPopup(marker.clone()));
    }
}
