use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::ADDITIONAL_PANEL_SUFFIX;

/// Identifier shared by a location's list input, map marker and detail panel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId")]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Element id of the detail panel belonging to this location.
    pub fn additional_panel_id(&self) -> String {
        format!("{}{}", self.0, ADDITIONAL_PANEL_SUFFIX)
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// Carriers render ids either as strings or as bare numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for LocationId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(id) => Self(id),
            RawId::Number(id) => Self(id.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A pickup point as rendered in the list and placed on the map.
///
/// On the wire a location is the tuple `[label, lat, lng, id]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireLocation", into = "WireLocation")]
pub struct PickupLocation {
    pub label: String,
    pub position: LatLng,
    pub id: LocationId,
}

impl PickupLocation {
    pub fn new(label: impl Into<String>, lat: f64, lng: f64, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            position: LatLng::new(lat, lng),
            id: LocationId::new(id),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireLocation(String, Coordinate, Coordinate, LocationId);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn into_degrees(self) -> Result<f64, String> {
        match self {
            Coordinate::Number(value) => Ok(value),
            Coordinate::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| format!("invalid coordinate `{text}`")),
        }
    }
}

impl TryFrom<WireLocation> for PickupLocation {
    type Error = String;

    fn try_from(WireLocation(label, lat, lng, id): WireLocation) -> Result<Self, String> {
        Ok(Self {
            label,
            position: LatLng::new(lat.into_degrees()?, lng.into_degrees()?),
            id,
        })
    }
}

impl From<PickupLocation> for WireLocation {
    fn from(location: PickupLocation) -> Self {
        WireLocation(
            location.label,
            Coordinate::Number(location.position.lat),
            Coordinate::Number(location.position.lng),
            location.id,
        )
    }
}
