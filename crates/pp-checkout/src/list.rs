use std::{cell::RefCell, future::Future, rc::Rc};

use crate::{
    error::FetchError,
    options::Options,
    page::{CheckoutPage, ShippingMethod},
    transport::{FetchParams, Transport},
};

/// How a single list load ended.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The fragment was inserted into the page.
    Loaded {
        method: ShippingMethod,
        markup: String,
    },
    /// The latest load failed. Nothing was inserted.
    Failed(FetchError),
    /// A newer load was issued before this one answered, and this answer was
    /// either a failure or stale responses are ignored. The page was left alone.
    Superseded,
}

/// Where a bound search form sends its refined requests.
#[derive(Clone, Debug)]
struct SearchBinding {
    source: ShippingMethod,
    index: String,
    method: String,
}

#[derive(Debug, Default)]
struct ListState {
    settings: Options,
    initialized: bool,
    sequence: u64,
    outstanding: usize,
    search: Option<SearchBinding>,
}

/// Fetches, injects and removes the pickup list fragment.
///
/// Clones share the same state, so a handle can be moved into every pending load.
pub struct ListController<P, T> {
    page: Rc<P>,
    transport: Rc<T>,
    state: Rc<RefCell<ListState>>,
}

impl<P, T> Clone for ListController<P, T> {
    fn clone(&self) -> Self {
        Self {
            page: Rc::clone(&self.page),
            transport: Rc::clone(&self.transport),
            state: Rc::clone(&self.state),
        }
    }
}

impl<P, T> ListController<P, T>
where
    P: CheckoutPage + 'static,
    T: Transport + 'static,
{
    pub fn new(page: Rc<P>, transport: T) -> Self {
        Self {
            page,
            transport: Rc::new(transport),
            state: Rc::new(RefCell::new(ListState::default())),
        }
    }

    pub fn configure(&self, options: Options) {
        self.state.borrow_mut().settings.merge(options);
    }

    pub fn settings(&self) -> Options {
        self.state.borrow().settings.clone()
    }

    /// Start listening to the shipping method group.
    ///
    /// Returns the load for the pickup method that is already checked, if any.
    pub fn initialize(&self) -> Option<impl Future<Output = LoadOutcome> + 'static> {
        self.state.borrow_mut().initialized = true;
        let selected = self
            .page
            .shipping_methods()
            .into_iter()
            .find(|method| method.is_pickup && method.checked)?;
        tracing::debug!(method = %selected.code, "pickup method preselected");
        Some(self.load(&selected, &selected.index, &selected.code, FetchParams::new()))
    }

    /// React to a change event on the shipping method group.
    ///
    /// Any change drops the current list; a pickup method then loads its own.
    pub fn method_changed(
        &self,
        method: &ShippingMethod,
    ) -> Option<impl Future<Output = LoadOutcome> + 'static> {
        if !self.state.borrow().initialized {
            return None;
        }
        self.remove_list();
        // A list requested for the previous method no longer belongs on the page.
        self.state.borrow_mut().sequence += 1;
        if !method.is_pickup {
            return None;
        }
        Some(self.load(method, &method.index, &method.code, FetchParams::new()))
    }

    /// Fetch the list for `method` and insert it after `source`.
    ///
    /// The previous list is removed and the loading indicator raised before
    /// this returns; the returned future performs the request.
    pub fn load(
        &self,
        source: &ShippingMethod,
        index: &str,
        method: &str,
        params: FetchParams,
    ) -> impl Future<Output = LoadOutcome> + 'static {
        let params = params.with_index(index);
        let url = self.endpoint(method);

        self.remove_list();
        let sequence = {
            let mut state = self.state.borrow_mut();
            state.sequence += 1;
            state.sequence
        };
        let outstanding = OutstandingFetch::start(Rc::clone(&self.page), Rc::clone(&self.state));
        tracing::debug!(%url, sequence, fields = params.len(), "requesting pickup list");

        let controller = self.clone();
        let source = source.clone();
        let index = index.to_owned();
        let method = method.to_owned();
        async move {
            let response = controller.transport.post_form(&url, &params).await;
            drop(outstanding);
            controller.settle(sequence, response, source, &index, &method)
        }
    }

    /// Clear the loading class, then set it again when `active`.
    pub fn toggle_loading(&self, active: bool) {
        toggle_loading(self.page.as_ref(), active);
    }

    pub fn remove_list(&self) {
        self.page.remove_list();
        self.state.borrow_mut().search = None;
    }

    /// Route submissions of the search form in the current fragment back into [`load`](Self::load).
    ///
    /// Replaces any earlier binding; without a search form in the page nothing is bound.
    pub fn bind_search(&self, source: &ShippingMethod, index: &str, method: &str) {
        let binding = self.page.has_search_form().then(|| SearchBinding {
            source: source.clone(),
            index: index.to_owned(),
            method: method.to_owned(),
        });
        self.state.borrow_mut().search = binding;
    }

    /// Handle a submission of the bound search form carrying its serialized `fields`.
    pub fn submit_search(
        &self,
        fields: FetchParams,
    ) -> Option<impl Future<Output = LoadOutcome> + 'static> {
        let binding = self.state.borrow().search.clone()?;
        tracing::debug!(method = %binding.method, "refining pickup list");
        Some(self.load(&binding.source, &binding.index, &binding.method, fields))
    }

    pub fn is_search_bound(&self) -> bool {
        self.state.borrow().search.is_some()
    }

    fn endpoint(&self, method: &str) -> String {
        let state = self.state.borrow();
        let base = state.settings.url().unwrap_or_else(|| {
            tracing::warn!("no pickup list url configured");
            ""
        });
        format!("{base}/{method}")
    }

    fn settle(
        &self,
        sequence: u64,
        response: Result<String, FetchError>,
        source: ShippingMethod,
        index: &str,
        method: &str,
    ) -> LoadOutcome {
        let (latest, ignore_stale) = {
            let state = self.state.borrow();
            (
                sequence == state.sequence,
                state.settings.ignore_stale_responses(),
            )
        };

        match response {
            Err(error) if !latest => {
                tracing::debug!(%error, sequence, method, "superseded pickup list request failed");
                LoadOutcome::Superseded
            }
            Err(error) => {
                tracing::warn!(%error, method, "pickup list request failed");
                LoadOutcome::Failed(error)
            }
            Ok(_) if ignore_stale && !latest => {
                tracing::debug!(sequence, method, "dropping superseded pickup list");
                LoadOutcome::Superseded
            }
            Ok(markup) => {
                self.page.remove_list();
                self.page.insert_list_after(&source, &markup);
                self.bind_search(&source, index, method);
                tracing::debug!(sequence, method, "pickup list inserted");
                LoadOutcome::Loaded {
                    method: source,
                    markup,
                }
            }
        }
    }
}

/// Keeps the loading indicator raised while a fetch is in flight.
///
/// Dropping it, whether the load settled or its future was abandoned, lowers
/// the indicator once no other fetch is outstanding.
struct OutstandingFetch<P: CheckoutPage> {
    page: Rc<P>,
    state: Rc<RefCell<ListState>>,
}

impl<P: CheckoutPage> OutstandingFetch<P> {
    fn start(page: Rc<P>, state: Rc<RefCell<ListState>>) -> Self {
        state.borrow_mut().outstanding += 1;
        toggle_loading(page.as_ref(), true);
        Self { page, state }
    }
}

impl<P: CheckoutPage> Drop for OutstandingFetch<P> {
    fn drop(&mut self) {
        let outstanding = {
            let mut state = self.state.borrow_mut();
            state.outstanding = state.outstanding.saturating_sub(1);
            state.outstanding
        };
        toggle_loading(self.page.as_ref(), outstanding > 0);
    }
}

fn toggle_loading<P: CheckoutPage + ?Sized>(page: &P, active: bool) {
    page.set_loading(false);
    if active {
        page.set_loading(true);
    }
}
