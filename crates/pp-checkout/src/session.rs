use std::future::Future;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    fragment::extract_locations,
    list::{ListController, LoadOutcome},
    location::LocationId,
    map::{MapBackend, MapController},
    page::{CheckoutPage, ShippingMethod},
    transport::{FetchParams, Transport},
};

/// Something the shopper did on the checkout page.
#[derive(Clone, Debug, PartialEq)]
pub enum PageEvent {
    /// A shipping method input changed.
    MethodChanged(ShippingMethod),
    /// The search-refinement form was submitted with these fields.
    SearchSubmitted(FetchParams),
    /// A map marker was clicked.
    MarkerClicked(LocationId),
    /// A location was chosen in the list.
    LocationChosen(LocationId),
}

/// One checkout page: the pickup list, the map, and the events between them.
///
/// Must run inside a [`tokio::task::LocalSet`]; list loads are spawned as local tasks.
pub struct CheckoutSession<P, T, B: MapBackend> {
    list: ListController<P, T>,
    map: MapController<B, P>,
    pending: usize,
}

impl<P, T, B> CheckoutSession<P, T, B>
where
    P: CheckoutPage + 'static,
    T: Transport + 'static,
    B: MapBackend,
{
    pub fn new(list: ListController<P, T>, map: MapController<B, P>) -> Self {
        Self {
            list,
            map,
            pending: 0,
        }
    }

    pub fn list(&self) -> &ListController<P, T> {
        &self.list
    }

    pub fn map(&self) -> &MapController<B, P> {
        &self.map
    }

    /// Initialize both controllers and handle `events` until the sender is
    /// dropped and every list load has settled.
    pub async fn run(mut self, mut events: UnboundedReceiver<PageEvent>) -> Self {
        let (settled_tx, mut settled_rx) = mpsc::unbounded_channel();

        self.map.initialize();
        if let Some(load) = self.list.initialize() {
            self.spawn_load(load, &settled_tx);
        }

        let mut listening = true;
        while listening || self.pending > 0 {
            tokio::select! {
                event = events.recv(), if listening => match event {
                    Some(event) => self.handle(event, &settled_tx),
                    None => listening = false,
                },
                Some(outcome) = settled_rx.recv(), if self.pending > 0 => {
                    self.pending -= 1;
                    self.settled(outcome);
                }
            }
        }
        self
    }

    fn handle(&mut self, event: PageEvent, settled_tx: &UnboundedSender<LoadOutcome>) {
        tracing::debug!(?event, "checkout event");
        match event {
            PageEvent::MethodChanged(method) => {
                self.map.clear_markers();
                if let Some(load) = self.list.method_changed(&method) {
                    self.spawn_load(load, settled_tx);
                }
            }
            PageEvent::SearchSubmitted(fields) => {
                if let Some(load) = self.list.submit_search(fields) {
                    self.map.clear_markers();
                    self.spawn_load(load, settled_tx);
                }
            }
            PageEvent::MarkerClicked(id) => {
                self.map.select(&id);
            }
            PageEvent::LocationChosen(id) => self.map.update(&id),
        }
    }

    fn settled(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded { markup, .. } => {
                self.map.set_locations(&extract_locations(&markup));
            }
            LoadOutcome::Failed(_) => self.map.clear_markers(),
            LoadOutcome::Superseded => {}
        }
    }

    fn spawn_load(
        &mut self,
        load: impl Future<Output = LoadOutcome> + 'static,
        settled_tx: &UnboundedSender<LoadOutcome>,
    ) {
        self.pending += 1;
        let settled_tx = settled_tx.clone();
        tokio::task::spawn_local(async move {
            let _ = settled_tx.send(load.await);
        });
    }
}
