/// Class of the search-refinement form inside the list fragment
pub const SEARCH_FORM_CLASS: &str = "pickup-address";

/// Suffix appended to a location id to build its detail panel id
pub const ADDITIONAL_PANEL_SUFFIX: &str = "_additional";

/// Request field carrying the shipping method index
pub const INDEX_PARAM: &str = "index";

/// Attribute of the list fragment holding the encoded location array
pub const LOCATIONS_ATTRIBUTE: &str = "data-pickup-locations";

/// Zoom level used when a single location is placed on the map
pub const SINGLE_LOCATION_ZOOM: u8 = 15;

/// Default tile layer for the pickup map
pub const DEFAULT_TILE_URL_FORMAT: &str =
    "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}";
pub const DEFAULT_TILE_ATTRIBUTION: &str = "&copy; <a href=\"http://www.openstreetmap.org/copyright\">OpenStreetMap</a>, &copy; <a href=\"https://carto.com/attributions\">CARTO</a>";
pub const DEFAULT_TILE_SUBDOMAINS: &str = "abcd";
pub const DEFAULT_TILE_MAX_ZOOM: u8 = 18;
pub const DEFAULT_TILE_LAYER_ID: &str = "mapbox.streets";
