use geo::MultiPolygon;

use crate::{
    error::{ExplorerError, QueryError},
    types::{
        CategorySelection, DisplayToggles, FeatureCollection, PlaceBoundary, ResolvedCategory,
        TagFilter,
    },
};

use super::{MapSurface, RenderOutcome, render_collection};

pub const DEFAULT_TITLE: &str = "OpenStreetMap Search";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Searching,
    Updating,
    Rendered,
    NoData,
    NotFound,
    QueryFailed,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "Ready",
            Phase::Searching => "Searching...",
            Phase::Updating => "Updating...",
            Phase::Rendered => "Showing results",
            Phase::NoData => "No data",
            Phase::NotFound => "Place not found",
            Phase::QueryFailed => "Query failed",
        }
    }
}

/// What the next update needs, worked out from the state alone.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePlan {
    /// Nothing searched yet, geocode the search field first.
    Search,
    DrawBoundary(FeatureCollection),
    QueryFeatures {
        area: MultiPolygon<f64>,
        filter: TagFilter,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A message the user has to acknowledge.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn no_data() -> Self {
        Notice {
            severity: Severity::Info,
            title: "No Data".to_string(),
            body: "No features found.".to_string(),
        }
    }
}

impl From<&ExplorerError> for Notice {
    fn from(err: &ExplorerError) -> Self {
        Notice {
            severity: Severity::Error,
            title: err.title().to_string(),
            body: err.to_string(),
        }
    }
}

/// Everything the explorer knows between two events. Only ever touched from
/// one thread.
#[derive(Debug, Clone)]
pub struct ExplorerState {
    pub search_text: String,
    pub custom_tag: String,
    pub toggles: DisplayToggles,
    category: CategorySelection,
    boundary: Option<PlaceBoundary>,
    rendered: Option<FeatureCollection>,
    phase: Phase,
    title: String,
}

impl Default for ExplorerState {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            custom_tag: String::new(),
            toggles: DisplayToggles::default(),
            category: CategorySelection::default(),
            boundary: None,
            rendered: None,
            phase: Phase::Idle,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl ExplorerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self) -> &CategorySelection {
        &self.category
    }

    pub fn boundary(&self) -> Option<&PlaceBoundary> {
        self.boundary.as_ref()
    }

    /// The collection currently on the map.
    pub fn rendered(&self) -> Option<&FeatureCollection> {
        self.rendered.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn select_category(&mut self, category: CategorySelection) {
        self.category = category;
    }

    pub fn set_custom_tag(&mut self, tag: impl Into<String>) {
        self.custom_tag = tag.into();
    }

    /// Validates the search field and marks a search as running.
    pub fn begin_search(&mut self) -> Result<String, ExplorerError> {
        let place = self.search_text.trim();
        if place.is_empty() {
            return Err(ExplorerError::EmptySearch);
        }
        let place = place.to_string();
        self.phase = Phase::Searching;
        self.title = format!("Searching for {place}...");
        Ok(place)
    }

    pub fn search_failed(&mut self) {
        self.phase = Phase::NotFound;
        self.title = DEFAULT_TITLE.to_string();
    }

    /// The user has dismissed the notice for a failed search.
    pub fn acknowledge(&mut self) {
        if self.phase == Phase::NotFound {
            self.phase = Phase::Idle;
        }
    }

    /// Stores a freshly geocoded boundary. Whatever was drawn for the old
    /// one is no longer valid.
    pub fn accept_boundary(&mut self, boundary: PlaceBoundary) -> FeatureCollection {
        self.title = format!("{DEFAULT_TITLE} - {}", boundary.query);
        self.phase = Phase::Idle;
        self.rendered = None;
        let collection = boundary.collection.clone();
        self.boundary = Some(boundary);
        collection
    }

    pub fn plan_update(&mut self) -> Result<UpdatePlan, ExplorerError> {
        let Some(boundary) = &self.boundary else {
            return Ok(UpdatePlan::Search);
        };

        let resolved = match self.category.resolve(&self.custom_tag) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.phase = Phase::QueryFailed;
                return Err(err.into());
            }
        };

        let plan = match resolved {
            ResolvedCategory::Boundary => UpdatePlan::DrawBoundary(boundary.collection.clone()),
            ResolvedCategory::Filter(filter) => {
                let Some(area) = boundary.dissolved() else {
                    self.phase = Phase::QueryFailed;
                    return Err(QueryError::Service(format!(
                        "'{}' has no polygon to search in",
                        boundary.query
                    ))
                    .into());
                };
                UpdatePlan::QueryFeatures { area, filter }
            }
        };
        self.phase = Phase::Updating;
        Ok(plan)
    }

    pub fn update_failed(&mut self) {
        self.phase = Phase::QueryFailed;
    }

    /// Draws `collection` and remembers it for later redraws.
    pub fn render(
        &mut self,
        collection: FeatureCollection,
        surface: &mut dyn MapSurface,
    ) -> Result<RenderOutcome, ExplorerError> {
        match render_collection(&collection, &self.toggles, surface) {
            Ok(outcome) => {
                self.phase = match outcome {
                    RenderOutcome::NoData => Phase::NoData,
                    RenderOutcome::Drawn { .. } => Phase::Rendered,
                };
                self.rendered = Some(collection);
                Ok(outcome)
            }
            Err(err) => {
                self.phase = Phase::QueryFailed;
                Err(err.into())
            }
        }
    }

    /// Draws the current collection again, picking up toggle changes.
    pub fn redraw(
        &mut self,
        surface: &mut dyn MapSurface,
    ) -> Option<Result<RenderOutcome, ExplorerError>> {
        let collection = self.rendered.clone()?;
        Some(self.render(collection, surface))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::{RecordingSurface, example_city};
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_search_is_refused_without_touching_state() {
        let mut state = ExplorerState::new();
        state.search_text = "   ".to_string();

        assert_eq!(state.begin_search(), Err(ExplorerError::EmptySearch));
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.title(), DEFAULT_TITLE);
    }

    #[test]
    fn title_follows_the_search() {
        let mut state = ExplorerState::new();
        state.search_text = " Example City ".to_string();

        assert_eq!(state.begin_search().unwrap(), "Example City");
        assert_eq!(state.title(), "Searching for Example City...");
        assert_eq!(state.phase(), Phase::Searching);

        state.accept_boundary(example_city());
        assert_eq!(state.title(), "OpenStreetMap Search - Example City");

        state.begin_search().unwrap();
        state.search_failed();
        assert_eq!(state.title(), DEFAULT_TITLE);
        assert_eq!(state.phase(), Phase::NotFound);
        assert_eq!(state.boundary(), Some(&example_city()));
    }

    #[test]
    fn not_found_returns_to_idle_once_acknowledged() {
        let mut state = ExplorerState::new();
        state.search_text = "Atlantis".to_string();
        state.begin_search().unwrap();
        assert_eq!(state.phase(), Phase::Searching);

        state.search_failed();
        assert_eq!(state.phase().label(), "Place not found");
        state.acknowledge();
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn acknowledging_leaves_other_phases_alone() {
        let mut state = ExplorerState::new();
        state.accept_boundary(example_city());
        state.select_category(CategorySelection::tag("amenity"));
        state.plan_update().unwrap();
        state.update_failed();

        state.acknowledge();
        assert_eq!(state.phase(), Phase::QueryFailed);
    }

    #[test]
    fn update_without_boundary_asks_for_a_search() {
        let mut state = ExplorerState::new();
        state.select_category(CategorySelection::tag("amenity"));
        assert_eq!(state.plan_update().unwrap(), UpdatePlan::Search);
    }

    #[test]
    fn update_plans_follow_the_category() {
        let mut state = ExplorerState::new();
        state.accept_boundary(example_city());

        assert_eq!(
            state.plan_update().unwrap(),
            UpdatePlan::DrawBoundary(example_city().collection)
        );

        state.select_category(CategorySelection::tag("amenity"));
        let UpdatePlan::QueryFeatures { area, filter } = state.plan_update().unwrap() else {
            panic!("expected a feature query");
        };
        assert_eq!(filter, TagFilter::presence("amenity"));
        assert_eq!(Some(area), example_city().dissolved());
        assert_eq!(state.phase(), Phase::Updating);
    }

    #[test]
    fn new_boundary_forgets_the_old_drawing() {
        let mut state = ExplorerState::new();
        let collection = state.accept_boundary(example_city());
        state.render(collection, &mut RecordingSurface::default()).unwrap();
        assert!(state.rendered().is_some());

        state.accept_boundary(example_city());
        assert_eq!(state.rendered(), None);
    }

    #[test]
    fn redraw_needs_something_drawn() {
        let mut state = ExplorerState::new();
        assert!(state.redraw(&mut RecordingSurface::default()).is_none());
    }

    #[test]
    fn error_notice_uses_error_text() {
        let err = ExplorerError::not_found("Atlantis", "no such place");
        let notice = Notice::from(&err);
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(notice.title, "Error");
        assert_eq!(notice.body, err.to_string());
    }
}
