pub mod constants;
pub mod error;
pub mod fragment;
pub mod list;
pub mod location;
pub mod map;
pub mod options;
pub mod page;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use list::{ListController, LoadOutcome};
pub use location::{LatLng, LocationId, PickupLocation};
pub use map::{MapBackend, MapController, MapSurface};
pub use options::Options;
pub use page::{CheckoutPage, MemoryPage, ShippingMethod};
pub use session::{CheckoutSession, PageEvent};
pub use transport::{FetchParams, HttpTransport, Transport};
