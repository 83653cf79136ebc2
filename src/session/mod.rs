//! Runs the explorer inside the map viewer.
//!
//! The UI writes [`SessionCommand`]s. Commands that need a remote service are
//! handed to the [`ExplorerWorker`]; its answers come back on a channel and
//! are applied to the [`Session`] here, on the main schedule.

mod renderer;
mod ui;
mod worker;

use std::sync::Arc;

use bevy::prelude::*;
use bevy_egui::EguiPreUpdateSet;

pub use renderer::*;
pub use ui::*;
pub use worker::*;

use crate::{
    config::ExplorerConfig,
    error::ExplorerError,
    geocode::NominatimClient,
    overpass::OverpassClient,
    pipeline::{ExplorerState, MapSurface, Notice, RenderOutcome, UpdatePlan},
};

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Search,
    Update,
    /// Draw the current collection again with the current toggles.
    Redraw,
}

#[derive(Resource, Default)]
pub struct Session {
    pub state: ExplorerState,
    pub notice: Option<Notice>,
}

impl Session {
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
        self.state.acknowledge();
    }

    fn report(&mut self, err: &ExplorerError) {
        warn!("{}", err);
        self.notice = Some(Notice::from(err));
    }

    fn show(&mut self, rendered: Result<RenderOutcome, ExplorerError>) {
        match rendered {
            Ok(RenderOutcome::Drawn { stats, .. }) => info!(
                "Drew {} polygons, {} points and {} lines",
                stats.polygons, stats.points, stats.lines
            ),
            Ok(RenderOutcome::NoData) => {
                info!("No features found");
                self.notice = Some(Notice::no_data());
            }
            Err(err) => self.report(&err),
        }
    }
}

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<ExplorerConfig>()
            .cloned()
            .unwrap_or_default();
        if !app.world().contains_resource::<ExplorerConfig>() {
            app.insert_resource(config.clone());
        }

        app.insert_resource(Services {
            geocoder: Arc::new(NominatimClient::new(&config)),
            features: Arc::new(OverpassClient::new(&config)),
        })
        .init_resource::<Session>()
        .init_resource::<ExplorerWorker>()
        .init_resource::<MapLayers>()
        .init_resource::<ProjectedLayers>()
        .add_event::<SessionCommand>()
        .add_systems(Startup, (configure_gizmos, starting_viewport))
        .add_systems(
            Update,
            (
                search_bar_ui.after(EguiPreUpdateSet::InitContexts),
                features_sidebar_ui.after(EguiPreUpdateSet::InitContexts),
                notice_ui.after(EguiPreUpdateSet::InitContexts),
            ),
        )
        .add_systems(
            Update,
            (
                handle_commands,
                apply_finished_jobs,
                project_layers,
                apply_viewport,
                draw_layers,
                sync_window_title,
            )
                .chain()
                .after(search_bar_ui)
                .after(features_sidebar_ui),
        )
        .add_systems(Update, cleanup_tasks);
    }
}

fn starting_viewport(config: Res<ExplorerConfig>, mut layers: ResMut<MapLayers>) {
    layers.set_viewport(config.starting_location, config.starting_zoom);
}

fn handle_commands(
    mut commands: Commands,
    mut events: EventReader<SessionCommand>,
    mut session: ResMut<Session>,
    mut worker: ResMut<ExplorerWorker>,
    services: Res<Services>,
    mut layers: ResMut<MapLayers>,
) {
    for event in events.read() {
        match event {
            SessionCommand::Search => {
                start_search(&mut commands, &mut session, &mut worker, &services)
            }
            SessionCommand::Update => match session.state.plan_update() {
                Ok(UpdatePlan::Search) => {
                    start_search(&mut commands, &mut session, &mut worker, &services)
                }
                Ok(UpdatePlan::DrawBoundary(outline)) => {
                    let rendered = session.state.render(outline, &mut *layers);
                    session.show(rendered);
                }
                Ok(UpdatePlan::QueryFeatures { area, filter }) => {
                    info!("Querying features for {:?}", filter);
                    worker.submit(&mut commands, &services, Job::Features { area, filter });
                }
                Err(err) => session.report(&err),
            },
            SessionCommand::Redraw => {
                if let Some(Err(err)) = session.state.redraw(&mut *layers) {
                    session.report(&err);
                }
            }
        }
    }
}

fn start_search(
    commands: &mut Commands,
    session: &mut Session,
    worker: &mut ExplorerWorker,
    services: &Services,
) {
    match session.state.begin_search() {
        Ok(place) => worker.submit(commands, services, Job::Geocode(place)),
        Err(err) => session.report(&err),
    }
}

fn apply_finished_jobs(
    mut session: ResMut<Session>,
    mut worker: ResMut<ExplorerWorker>,
    mut layers: ResMut<MapLayers>,
) {
    for outcome in worker.finished() {
        match outcome {
            JobOutcome::Boundary(Ok(boundary)) => {
                info!("Found '{}'", boundary.display_name);
                let outline = session.state.accept_boundary(boundary);
                let rendered = session.state.render(outline, &mut *layers);
                session.show(rendered);
            }
            JobOutcome::Boundary(Err(err)) => {
                session.state.search_failed();
                session.report(&err);
            }
            JobOutcome::Features(Ok(collection)) => {
                info!("Received {} features", collection.len());
                let rendered = session.state.render(collection, &mut *layers);
                session.show(rendered);
            }
            JobOutcome::Features(Err(err)) => {
                session.state.update_failed();
                session.report(&err);
            }
        }
    }
}
