//! Assembler state and the mutators driven by the controls

use crate::command::AquariumCommand;
use crate::config::AquariumConfig;
use crate::school::School;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// What is drawn behind the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backdrop {
    #[default]
    Empty,
    TestImage,
}

impl Backdrop {
    pub fn toggled(self) -> Self {
        match self {
            Backdrop::Empty => Backdrop::TestImage,
            Backdrop::TestImage => Backdrop::Empty,
        }
    }
}

/// Everything the controls can change.
///
/// The render side reads this state every frame and mirrors it onto the
/// scene graph.
#[derive(Debug, Clone)]
pub struct Aquarium {
    school: School,
    squid_visible: bool,
    backdrop: Backdrop,
    mirror_mode: bool,
    spot_intensities: Vec<f32>,
    visible_threshold: usize,
    speed_multiplier: f32,
    light_intensity: f32,
}

impl Aquarium {
    pub fn new<R: Rng>(config: &AquariumConfig, rng: &mut R) -> Self {
        let school = School::spawn(rng, &config.fish);
        let mut aquarium = Self {
            school,
            squid_visible: false,
            backdrop: Backdrop::Empty,
            mirror_mode: false,
            spot_intensities: vec![config.controls.light_default; config.lights.spot_count],
            visible_threshold: 0,
            speed_multiplier: 1.0,
            light_intensity: config.controls.light_default,
        };
        aquarium.set_visible_fish(config.fish.initial_visible);
        aquarium.set_speed_multiplier(config.controls.speed_default);
        aquarium
    }

    /// Seeded from `config.fish.seed`, or from the OS when absent
    pub fn from_config(config: &AquariumConfig) -> Self {
        let mut rng = match config.fish.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let aquarium = Self::new(config, &mut rng);
        info!(
            fish = aquarium.school.len(),
            visible = aquarium.visible_threshold,
            seed = ?config.fish.seed,
            "Aquarium created"
        );
        aquarium
    }

    pub fn school(&self) -> &School {
        &self.school
    }

    pub fn squid_visible(&self) -> bool {
        self.squid_visible
    }

    pub fn backdrop(&self) -> Backdrop {
        self.backdrop
    }

    pub fn mirror_mode(&self) -> bool {
        self.mirror_mode
    }

    /// The floor is shown exactly when the mirror is not
    pub fn floor_visible(&self) -> bool {
        !self.mirror_mode
    }

    pub fn spot_intensities(&self) -> &[f32] {
        &self.spot_intensities
    }

    pub fn visible_threshold(&self) -> usize {
        self.visible_threshold
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn light_intensity(&self) -> f32 {
        self.light_intensity
    }

    /// Show fish with index below `threshold`, hide the others
    pub fn set_visible_fish(&mut self, threshold: usize) {
        let changed = self.school.set_visible_count(threshold);
        self.visible_threshold = threshold;
        debug!(threshold, changed, "Visible fish updated");
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.school.set_speed_multiplier(multiplier);
        self.speed_multiplier = multiplier;
    }

    pub fn toggle_squid(&mut self) {
        self.squid_visible = !self.squid_visible;
        debug!(visible = self.squid_visible, "Squid toggled");
    }

    pub fn toggle_background(&mut self) {
        self.backdrop = self.backdrop.toggled();
        debug!(backdrop = ?self.backdrop, "Background toggled");
    }

    /// Every spotlight takes `intensity` exactly
    pub fn set_light_intensity(&mut self, intensity: f32) {
        self.spot_intensities.fill(intensity);
        self.light_intensity = intensity;
    }

    pub fn toggle_mirror(&mut self) {
        self.mirror_mode = !self.mirror_mode;
        debug!(mirror = self.mirror_mode, "Mirror toggled");
    }

    pub fn apply(&mut self, command: AquariumCommand) {
        match command {
            AquariumCommand::SetVisibleFish(threshold) => self.set_visible_fish(threshold),
            AquariumCommand::SetSpeedMultiplier(multiplier) => {
                self.set_speed_multiplier(multiplier)
            }
            AquariumCommand::ToggleSquid => self.toggle_squid(),
            AquariumCommand::ToggleBackground => self.toggle_background(),
            AquariumCommand::SetLightIntensity(intensity) => self.set_light_intensity(intensity),
            AquariumCommand::ToggleMirror => self.toggle_mirror(),
        }
    }
}
