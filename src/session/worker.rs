use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_tasks::futures_lite::future;
use crossbeam_channel::{Receiver, Sender, unbounded};
use geo::MultiPolygon;

use crate::{
    error::ExplorerError,
    geocode::Geocoder,
    overpass::FeatureSource,
    types::{FeatureCollection, PlaceBoundary, TagFilter},
};

/// The two remote services, shared with the background tasks.
#[derive(Resource, Clone)]
pub struct Services {
    pub geocoder: Arc<dyn Geocoder>,
    pub features: Arc<dyn FeatureSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Geocode(String),
    Features {
        area: MultiPolygon<f64>,
        filter: TagFilter,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Boundary(Result<PlaceBoundary, ExplorerError>),
    Features(Result<FeatureCollection, ExplorerError>),
}

#[derive(Debug)]
pub struct JobResult {
    generation: u64,
    outcome: JobOutcome,
}

/// Runs one job to completion on the calling thread.
pub fn run_job(services: &Services, job: Job) -> JobOutcome {
    match job {
        Job::Geocode(place) => JobOutcome::Boundary(services.geocoder.geocode(&place)),
        Job::Features { area, filter } => {
            JobOutcome::Features(services.features.features_within(&area, &filter))
        }
    }
}

/// Hands jobs to the async compute pool. Each job gets a generation number
/// and only the newest one may come back.
#[derive(Resource)]
pub struct ExplorerWorker {
    generation: u64,
    pending: Option<u64>,
    tx: Sender<JobResult>,
    rx: Receiver<JobResult>,
}

impl Default for ExplorerWorker {
    fn default() -> Self {
        let (tx, rx) = unbounded();
        ExplorerWorker {
            generation: 0,
            pending: None,
            tx,
            rx,
        }
    }
}

impl ExplorerWorker {
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Supersedes whatever is in flight.
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.pending = Some(self.generation);
        self.generation
    }

    pub fn submit(&mut self, commands: &mut Commands, services: &Services, job: Job) {
        let generation = self.next_generation();
        let tx = self.tx.clone();
        let services = services.clone();
        let task = AsyncComputeTaskPool::get().spawn(async move {
            let outcome = run_job(&services, job);
            let _ = tx.send(JobResult {
                generation,
                outcome,
            });
        });
        commands.spawn(TaskComponent(task));
    }

    /// Outcomes of the newest job. Anything older is dropped.
    pub fn finished(&mut self) -> Vec<JobOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            if let Some(outcome) = self.accept(result) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Delivers an answer as if a background task had finished.
    #[cfg(test)]
    pub(crate) fn complete(&self, generation: u64, outcome: JobOutcome) {
        let _ = self.tx.send(JobResult {
            generation,
            outcome,
        });
    }

    fn accept(&mut self, result: JobResult) -> Option<JobOutcome> {
        if self.pending == Some(result.generation) {
            self.pending = None;
            Some(result.outcome)
        } else {
            debug!(
                "Dropping result of superseded request {} (newest is {})",
                result.generation, self.generation
            );
            None
        }
    }
}

#[derive(Component)]
struct TaskComponent(Task<()>);

pub fn cleanup_tasks(mut commands: Commands, mut tasks: Query<(Entity, &mut TaskComponent)>) {
    for (entity, mut task) in tasks.iter_mut() {
        if future::block_on(future::poll_once(&mut task.0)).is_some() {
            commands.entity(entity).despawn();
        }
    }
}
