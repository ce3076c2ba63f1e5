use std::{cell::RefCell, collections::BTreeSet, sync::LazyLock};

use regex::Regex;

use crate::{
    constants::SEARCH_FORM_CLASS,
    location::LocationId,
};

/// A shipping method input on the checkout form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShippingMethod {
    /// Method code, also the last path segment of the list endpoint.
    pub code: String,
    /// Tab order of the input, sent as the `index` request field.
    pub index: String,
    /// Whether the input carries the pickup marker class.
    pub is_pickup: bool,
    pub checked: bool,
}

impl ShippingMethod {
    pub fn pickup(code: &str, index: &str) -> Self {
        Self {
            code: code.to_owned(),
            index: index.to_owned(),
            is_pickup: true,
            checked: false,
        }
    }

    pub fn home_delivery(code: &str, index: &str) -> Self {
        Self {
            is_pickup: false,
            ..Self::pickup(code, index)
        }
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }
}

/// The parts of the checkout page the controllers read and mutate.
///
/// In the browser these are the `#sylius-shipping-methods` input group
/// (pickup inputs carry the `pickup` class), the `.pickup-form` list
/// fragment, the `loading` class on the shipping step form and the
/// `.pickup-additional-data` detail panels.
///
/// Methods take `&self`: the page is shared between both controllers and
/// the pending list loads, and everything runs on one thread.
pub trait CheckoutPage {
    /// Every input of the shipping method group, in document order.
    fn shipping_methods(&self) -> Vec<ShippingMethod>;

    /// Insert a list fragment right after the item container of `anchor`.
    fn insert_list_after(&self, anchor: &ShippingMethod, markup: &str);

    /// Remove every injected list fragment. No-op when none is present.
    fn remove_list(&self);

    /// Add or remove the loading class on the checkout form.
    fn set_loading(&self, active: bool);

    /// Whether the injected fragment contains a search-refinement form.
    fn has_search_form(&self) -> bool;

    /// Check the list input whose id is `id`. Returns false when no such input exists.
    fn check_input(&self, id: &LocationId) -> bool;

    fn hide_additional_panels(&self);

    /// Show the panel with element id `panel_id`. Returns false when it does not exist.
    fn show_additional_panel(&self, panel_id: &str) -> bool;
}

/// A list fragment as it sits in a [`MemoryPage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertedList {
    pub anchor: String,
    pub markup: String,
}

#[derive(Debug, Default)]
struct PageState {
    methods: Vec<ShippingMethod>,
    lists: Vec<InsertedList>,
    loading: bool,
    checked_input: Option<LocationId>,
    visible_panels: BTreeSet<String>,
}

/// Headless checkout page backed by plain data.
///
/// Element ids are read straight from the injected markup, which is enough
/// to join list inputs and detail panels by location id.
#[derive(Debug, Default)]
pub struct MemoryPage {
    state: RefCell<PageState>,
}

static ELEMENT_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([a-zA-Z][a-zA-Z0-9-]*)\b[^>]*?\sid\s*=\s*["']([^"']+)["']"#)
        .expect("Invalid regex pattern")
});

static SEARCH_FORM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"<form\b[^>]*\sclass\s*=\s*["'][^"']*\b{SEARCH_FORM_CLASS}\b"#
    ))
    .expect("Invalid regex pattern")
});

impl MemoryPage {
    pub fn new(methods: Vec<ShippingMethod>) -> Self {
        Self {
            state: RefCell::new(PageState {
                methods,
                ..PageState::default()
            }),
        }
    }

    /// Check the method with `code` and uncheck every other one, as a radio group does.
    pub fn choose_method(&self, code: &str) -> Option<ShippingMethod> {
        let mut state = self.state.borrow_mut();
        let mut chosen = None;
        for method in state.methods.iter_mut() {
            method.checked = method.code == code;
            if method.checked {
                chosen = Some(method.clone());
            }
        }
        chosen
    }

    pub fn lists(&self) -> Vec<InsertedList> {
        self.state.borrow().lists.clone()
    }

    pub fn list_count(&self) -> usize {
        self.state.borrow().lists.len()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn checked_input(&self) -> Option<LocationId> {
        self.state.borrow().checked_input.clone()
    }

    pub fn visible_panels(&self) -> Vec<String> {
        self.state.borrow().visible_panels.iter().cloned().collect()
    }

    fn element_ids(&self) -> Vec<(String, String)> {
        self.state
            .borrow()
            .lists
            .iter()
            .flat_map(|list| {
                ELEMENT_ID_REGEX
                    .captures_iter(&list.markup)
                    .map(|captures| (captures[1].to_ascii_lowercase(), captures[2].to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl CheckoutPage for MemoryPage {
    fn shipping_methods(&self) -> Vec<ShippingMethod> {
        self.state.borrow().methods.clone()
    }

    fn insert_list_after(&self, anchor: &ShippingMethod, markup: &str) {
        self.state.borrow_mut().lists.push(InsertedList {
            anchor: anchor.code.clone(),
            markup: markup.to_owned(),
        });
    }

    fn remove_list(&self) {
        let mut state = self.state.borrow_mut();
        state.lists.clear();
        state.checked_input = None;
        state.visible_panels.clear();
    }

    fn set_loading(&self, active: bool) {
        self.state.borrow_mut().loading = active;
    }

    fn has_search_form(&self) -> bool {
        self.state
            .borrow()
            .lists
            .iter()
            .any(|list| SEARCH_FORM_REGEX.is_match(&list.markup))
    }

    fn check_input(&self, id: &LocationId) -> bool {
        let found = self
            .element_ids()
            .iter()
            .any(|(tag, element_id)| tag == "input" && element_id == id.as_str());
        if found {
            self.state.borrow_mut().checked_input = Some(id.clone());
        }
        found
    }

    fn hide_additional_panels(&self) {
        self.state.borrow_mut().visible_panels.clear();
    }

    fn show_additional_panel(&self, panel_id: &str) -> bool {
        let found = self
            .element_ids()
            .iter()
            .any(|(_, element_id)| element_id == panel_id);
        if found {
            self.state
                .borrow_mut()
                .visible_panels
                .insert(panel_id.to_owned());
        }
        found
    }
}
