/// Browser-side view-once marker.
///
/// A browser without the marker asks the server to count the visit; once a
/// count comes back it sets the marker and only ever reads afterwards.
/// The page script in `ui` carries the same transitions; this type only
/// models them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMarker {
    #[default]
    Uncounted,
    Counted,
}

pub const STORAGE_KEY: &str = "viewCounted";

impl ViewMarker {
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some(_) => ViewMarker::Counted,
            None => ViewMarker::Uncounted,
        }
    }

    pub fn request_path(self) -> &'static str {
        match self {
            ViewMarker::Uncounted => "/api/views?count=true",
            ViewMarker::Counted => "/api/views",
        }
    }

    /// State after the views request settles. A failed request leaves the
    /// marker alone so the next page load tries to count again.
    pub fn after_response(self, succeeded: bool) -> Self {
        if succeeded { ViewMarker::Counted } else { self }
    }
}
