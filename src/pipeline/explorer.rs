use crate::{
    error::ExplorerError,
    geocode::Geocoder,
    overpass::FeatureSource,
    types::CategorySelection,
};

use super::{ExplorerState, MapSurface, RenderOutcome, UpdatePlan};

/// The search, query and render pipeline run synchronously: each call
/// blocks until the services answer.
pub struct Explorer<G, F> {
    pub state: ExplorerState,
    geocoder: G,
    features: F,
}

impl<G: Geocoder, F: FeatureSource> Explorer<G, F> {
    pub fn new(geocoder: G, features: F) -> Self {
        Self {
            state: ExplorerState::new(),
            geocoder,
            features,
        }
    }

    /// Geocodes `place` and draws its outline.
    pub fn geocode(
        &mut self,
        place: &str,
        surface: &mut dyn MapSurface,
    ) -> Result<RenderOutcome, ExplorerError> {
        self.state.search_text = place.to_string();
        self.search(surface)
    }

    /// Geocodes whatever is in the search field and draws its outline.
    pub fn search(&mut self, surface: &mut dyn MapSurface) -> Result<RenderOutcome, ExplorerError> {
        let place = self.state.begin_search()?;
        let boundary = match self.geocoder.geocode(&place) {
            Ok(boundary) => boundary,
            Err(err) => {
                self.state.search_failed();
                return Err(err);
            }
        };
        let outline = self.state.accept_boundary(boundary);
        self.state.render(outline, surface)
    }

    pub fn select_category(&mut self, category: CategorySelection) {
        self.state.select_category(category);
    }

    pub fn update(&mut self, surface: &mut dyn MapSurface) -> Result<RenderOutcome, ExplorerError> {
        match self.state.plan_update()? {
            UpdatePlan::Search => self.search(surface),
            UpdatePlan::DrawBoundary(outline) => self.state.render(outline, surface),
            UpdatePlan::QueryFeatures { area, filter } => {
                let collection = match self.features.features_within(&area, &filter) {
                    Ok(collection) => collection,
                    Err(err) => {
                        self.state.update_failed();
                        return Err(err);
                    }
                };
                self.state.render(collection, surface)
            }
        }
    }

    pub fn redraw(
        &mut self,
        surface: &mut dyn MapSurface,
    ) -> Option<Result<RenderOutcome, ExplorerError>> {
        self.state.redraw(surface)
    }
}
