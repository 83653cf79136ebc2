use bevy::{prelude::*, render::view::RenderLayers, window::PrimaryWindow};
use bevy_map_viewer::{MapViewerMarker, TileMapResources, ZoomChangedEvent};

use crate::{
    config::ExplorerConfig,
    pipeline::{MapSurface, OutlineStyle},
    types::{BoundingBox, Coord},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportRequest {
    Center { center: Coord, zoom: u32 },
    Fit(BoundingBox),
}

/// What the pipeline last drew, kept in lat/lon so it can be projected again
/// whenever the tiles change zoom.
#[derive(Resource, Default, Debug)]
pub struct MapLayers {
    polygons: Vec<(Vec<Coord>, OutlineStyle)>,
    markers: Vec<Coord>,
    paths: Vec<Vec<Coord>>,
    viewport: Option<ViewportRequest>,
    respawn: bool,
}

impl MapLayers {
    pub fn polygons(&self) -> &[(Vec<Coord>, OutlineStyle)] {
        &self.polygons
    }

    pub fn markers(&self) -> &[Coord] {
        &self.markers
    }

    pub fn paths(&self) -> &[Vec<Coord>] {
        &self.paths
    }

    pub fn take_viewport(&mut self) -> Option<ViewportRequest> {
        self.viewport.take()
    }
}

impl MapSurface for MapLayers {
    fn clear_all(&mut self) {
        self.polygons.clear();
        self.markers.clear();
        self.paths.clear();
        self.respawn = true;
    }

    fn add_polygon(&mut self, outline: Vec<Coord>, style: &OutlineStyle) {
        self.polygons.push((outline, *style));
        self.respawn = true;
    }

    fn add_marker(&mut self, position: Coord) {
        self.markers.push(position);
        self.respawn = true;
    }

    fn add_path(&mut self, path: Vec<Coord>) {
        self.paths.push(path);
        self.respawn = true;
    }

    fn set_viewport(&mut self, center: Coord, zoom: u32) {
        self.viewport = Some(ViewportRequest::Center { center, zoom });
    }

    fn fit_bounding_box(&mut self, north_east: Coord, south_west: Coord) {
        self.viewport = Some(ViewportRequest::Fit(BoundingBox {
            north: north_east.lat,
            east: north_east.long,
            south: south_west.lat,
            west: south_west.long,
        }));
    }
}

/// World space copy of [`MapLayers`] for the current tile zoom.
#[derive(Resource, Default)]
pub struct ProjectedLayers {
    outlines: Vec<(Vec<Vec2>, Color)>,
    paths: Vec<Vec<Vec2>>,
}

#[derive(Component)]
pub struct FeatureMarker;

const PATH_COLOR: Srgba = Srgba {
    red: 0.2,
    green: 0.4,
    blue: 0.9,
    alpha: 0.9,
};

fn outline_color(style: &OutlineStyle) -> Color {
    let [r, g, b] = style.outline_color;
    Color::srgb_u8(r, g, b)
}

pub fn configure_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<DefaultGizmoConfigGroup>();
    config.line.width = OutlineStyle::default().border_width;
}

/// Rebuilds world space geometry after a new drawing or a tile zoom change.
pub fn project_layers(
    mut commands: Commands,
    mut layers: ResMut<MapLayers>,
    mut projected: ResMut<ProjectedLayers>,
    markers: Query<Entity, With<FeatureMarker>>,
    tile_map_res: Res<TileMapResources>,
    mut zoom_change: EventReader<ZoomChangedEvent>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    if !layers.respawn && zoom_change.is_empty() {
        return;
    }
    zoom_change.clear();
    layers.respawn = false;

    let to_world = |coord: &Coord| coord.to_map_coord().to_game_coords(tile_map_res.clone());

    projected.outlines = layers
        .polygons
        .iter()
        .map(|(outline, style)| (outline.iter().map(to_world).collect(), outline_color(style)))
        .collect();
    projected.paths = layers
        .paths
        .iter()
        .map(|path| path.iter().map(to_world).collect())
        .collect();

    for entity in markers.iter() {
        commands.entity(entity).despawn();
    }

    let fill_color = Srgba {
        red: 0.9,
        green: 0.2,
        blue: 0.2,
        alpha: 0.85,
    };
    let width = 5.;
    let elevation = 500.0;
    let mesh = meshes.add(Circle::new(width));
    let material = materials.add(Color::from(fill_color));

    for position in &layers.markers {
        let loc = to_world(position);
        commands.spawn((
            Mesh2d(mesh.clone()),
            Transform::from_translation(Vec3::new(loc.x, loc.y, elevation)),
            MeshMaterial2d(material.clone()),
            FeatureMarker,
            RenderLayers::layer(1),
        ));
    }
}

pub fn draw_layers(mut gizmos: Gizmos, projected: Res<ProjectedLayers>) {
    for (outline, color) in &projected.outlines {
        gizmos.linestrip_2d(outline.iter().copied(), *color);
    }
    for path in &projected.paths {
        gizmos.linestrip_2d(path.iter().copied(), PATH_COLOR);
    }
}

/// Moves the camera to whatever viewport the pipeline asked for.
pub fn apply_viewport(
    mut layers: ResMut<MapLayers>,
    mut tile_map_res: ResMut<TileMapResources>,
    mut camera: Query<(&mut Transform, &mut Projection), With<MapViewerMarker>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    config: Res<ExplorerConfig>,
    mut zoom_event: EventWriter<ZoomChangedEvent>,
) {
    let Some(request) = layers.take_viewport() else {
        return;
    };
    let Ok((mut camera_transform, mut projection)) = camera.single_mut() else {
        warn!("No map camera to move");
        return;
    };

    let (center, zoom) = match request {
        ViewportRequest::Center { center, zoom } => (center, zoom),
        ViewportRequest::Fit(bounds) => {
            let viewport = windows
                .single()
                .map(|window| (window.width() as f64, window.height() as f64))
                .unwrap_or((1200.0, 800.0));
            let zoom = bounds.fit_zoom(viewport, config.tile_quality as f64, config.max_zoom);
            (bounds.center(), zoom)
        }
    };

    tile_map_res.location_manager.location = center.to_map_coord();
    let target = center.to_map_coord().to_game_coords(tile_map_res.clone());
    camera_transform.translation = target.extend(camera_transform.translation.z);
    if let Projection::Orthographic(ortho) = projection.as_mut() {
        ortho.scale = zoom_scale(tile_map_res.zoom_manager.zoom_level, zoom);
    }
    debug!("Viewport moved to {:?} at zoom {}", center, zoom);
    zoom_event.write(ZoomChangedEvent);
}

/// Camera scale that shows the map at `zoom` while tiles are drawn at
/// `tile_zoom`.
pub fn zoom_scale(tile_zoom: u32, zoom: u32) -> f32 {
    2f32.powi(tile_zoom as i32 - zoom as i32)
}
