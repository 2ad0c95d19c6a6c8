//! Main camera, orbit navigation and the backdrop quad

use aquarium_core::config::CameraConfig;
use bevy::camera::visibility::RenderLayers;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::light::NotShadowCaster;
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::mirror::MIRROR_LAYER;
use crate::state::SceneConfig;

/// Share of the far plane at which the backdrop sits
const BACKDROP_DEPTH: f32 = 0.5;
const ELEVATION_LIMIT: f32 = 1.5;

/// Camera controller settings
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    pub target_distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
    pub target: Vec3,
    pub target_focus: Vec3,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl CameraSettings {
    /// Camera on +Z at the configured distance, looking at the origin
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            distance: config.distance,
            target_distance: config.distance,
            azimuth: 0.0,
            elevation: 0.0,
            target: Vec3::ZERO,
            target_focus: Vec3::ZERO,
            sensitivity: config.sensitivity,
            zoom_speed: config.zoom_speed,
            smooth_factor: config.smooth_factor,
            min_distance: 0.5,
            max_distance: config.far * BACKDROP_DEPTH,
        }
    }

    /// Camera position around `target` (Y up)
    pub fn position(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        self.target
            + self.distance * Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
    }

    fn orbit(&mut self, delta: Vec2) {
        self.azimuth -= delta.x * self.sensitivity;
        self.elevation = (self.elevation + delta.y * self.sensitivity)
            .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
    }

    fn zoom(&mut self, factor: f32) {
        self.target_distance =
            (self.target_distance * factor).clamp(self.min_distance, self.max_distance);
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Full-view quad behind the scene showing the test image
#[derive(Component)]
pub struct BackdropQuad;

/// Plugin for the main camera and its controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
            .add_systems(Update, (update_camera, fit_backdrop));
    }
}

fn projection(config: &CameraConfig) -> PerspectiveProjection {
    PerspectiveProjection {
        fov: config.fov_degrees.to_radians(),
        near: config.near,
        far: config.far,
        ..default()
    }
}

fn spawn_camera(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<SceneConfig>,
) {
    let settings = CameraSettings::from_config(&config.camera);
    let backdrop = materials.add(StandardMaterial {
        base_color_texture: Some(asset_server.load(config.assets.background.clone())),
        unlit: true,
        ..default()
    });

    commands
        .spawn((
            Camera3d::default(),
            Projection::Perspective(projection(&config.camera)),
            Transform::from_translation(settings.position()).looking_at(settings.target, Vec3::Y),
            RenderLayers::from_layers(&[0, MIRROR_LAYER]),
            MainCamera,
        ))
        .with_children(|camera| {
            camera.spawn((
                Mesh3d(meshes.add(Rectangle::new(1.0, 1.0))),
                MeshMaterial3d(backdrop),
                Transform::from_xyz(0.0, 0.0, -config.camera.far * BACKDROP_DEPTH),
                Visibility::Hidden,
                NotShadowCaster,
                BackdropQuad,
            ));
        });

    commands.insert_resource(settings);
}

/// Size of a camera-facing quad at `depth` that exactly fills the view
fn backdrop_size(fov: f32, depth: f32, aspect: f32) -> Vec2 {
    let height = 2.0 * depth * (fov * 0.5).tan();
    Vec2::new(height * aspect, height)
}

fn fit_backdrop(
    mut resized: MessageReader<WindowResized>,
    windows: Query<&Window, With<PrimaryWindow>>,
    added: Query<(), Added<BackdropQuad>>,
    mut backdrops: Query<&mut Transform, With<BackdropQuad>>,
    config: Res<SceneConfig>,
) {
    let resized = resized.read().count() > 0;
    if !resized && added.is_empty() {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    if window.height() <= 0.0 {
        return;
    }

    let depth = config.camera.far * BACKDROP_DEPTH;
    let size = backdrop_size(
        config.camera.fov_degrees.to_radians(),
        depth,
        window.width() / window.height(),
    );
    for mut transform in &mut backdrops {
        transform.scale = size.extend(1.0);
    }
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    settings: Option<ResMut<CameraSettings>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    time: Res<Time>,
    mut contexts: bevy_egui::EguiContexts,
) {
    let Some(mut settings) = settings else {
        return;
    };
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    let total_motion: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();
    let scroll: f32 = mouse_wheel.read().map(|wheel| wheel.y).sum();

    if !egui_wants_pointer {
        if mouse_button.pressed(MouseButton::Left) {
            settings.orbit(total_motion);
        }

        // Pan in the view plane
        if mouse_button.pressed(MouseButton::Right) {
            let right = Vec3::new(settings.azimuth.cos(), 0.0, -settings.azimuth.sin());
            let pan_speed = settings.distance * 0.002;
            settings.target_focus -= right * total_motion.x * pan_speed;
            settings.target_focus += Vec3::Y * total_motion.y * pan_speed;
        }

        if scroll != 0.0 {
            let factor = 1.0 - scroll * settings.zoom_speed * 0.3;
            settings.zoom(factor);
        }

        if touch_input.iter().count() == 1 {
            for touch in touch_input.iter() {
                settings.orbit(touch.delta());
            }
        }
    }

    // Pinch to zoom
    let touches: Vec<_> = touch_input.iter().collect();
    if let [t1, t2] = touches.as_slice() {
        let curr_dist = t1.position().distance(t2.position());
        let prev_dist = (t1.position() - t1.delta()).distance(t2.position() - t2.delta());
        settings.zoom(prev_dist / curr_dist.max(1.0));
    }

    let dt = time.delta_secs();
    let lerp_factor = 1.0 - (-settings.smooth_factor * 60.0 * dt).exp();
    let distance = settings.distance + (settings.target_distance - settings.distance) * lerp_factor;
    let target = settings.target + (settings.target_focus - settings.target) * lerp_factor;
    settings.distance = distance;
    settings.target = target;

    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = settings.position();
        transform.look_at(settings.target, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position_on_z_axis() {
        let settings = CameraSettings::from_config(&CameraConfig::default());
        let position = settings.position();
        assert!((position - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_orbit_clamps_elevation() {
        let mut settings = CameraSettings::from_config(&CameraConfig::default());
        settings.orbit(Vec2::new(0.0, 1.0e6));
        assert_eq!(settings.elevation, ELEVATION_LIMIT);
        settings.orbit(Vec2::new(0.0, -1.0e7));
        assert_eq!(settings.elevation, -ELEVATION_LIMIT);
    }

    #[test]
    fn test_zoom_stays_in_range() {
        let mut settings = CameraSettings::from_config(&CameraConfig::default());
        settings.zoom(1.0e-6);
        assert_eq!(settings.target_distance, settings.min_distance);
        settings.zoom(1.0e9);
        assert_eq!(settings.target_distance, settings.max_distance);
    }

    #[test]
    fn test_backdrop_fills_view() {
        let size = backdrop_size(std::f32::consts::FRAC_PI_2, 100.0, 2.0);
        assert!((size.y - 200.0).abs() < 1e-3);
        assert!((size.x - 400.0).abs() < 1e-3);
    }
}
