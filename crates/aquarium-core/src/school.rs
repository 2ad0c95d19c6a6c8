//! Fish school randomization and per-fish animation state

use crate::config::FishConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One fish: its model transform inside the pivot and its rotation speed
#[derive(Debug, Clone, PartialEq)]
pub struct Fish {
    /// Uniform model scale
    pub scale: f32,
    /// Model offset inside the pivot
    pub position: [f32; 3],
    /// Model orientation as XYZ Euler angles
    pub rotation: [f32; 3],
    /// Current pivot rotation speed (radians per frame)
    pub speed: f32,
    /// Speed drawn at creation, the base for every multiplier
    pub base_speed: f32,
    pub visible: bool,
}

impl Fish {
    /// Draw a fish from the configured ranges
    pub fn random<R: Rng>(rng: &mut R, config: &FishConfig) -> Self {
        let speed = sample(rng, config.speed);
        Self {
            scale: sample(rng, config.scale),
            position: [sample(rng, config.x), sample(rng, config.y), 0.0],
            rotation: config.rotation,
            speed,
            base_speed: speed,
            visible: true,
        }
    }
}

/// Uniform sample from an inclusive `[min, max]` pair
fn sample<R: Rng>(rng: &mut R, [min, max]: [f32; 2]) -> f32 {
    if min >= max {
        min
    } else {
        rng.random_range(min..=max)
    }
}

/// Every fish created at startup, indexed by creation order
#[derive(Debug, Clone, Default)]
pub struct School {
    fish: Vec<Fish>,
}

impl School {
    pub fn spawn<R: Rng>(rng: &mut R, config: &FishConfig) -> Self {
        let fish = (0..config.max)
            .map(|_| Fish::random(&mut *rng, config))
            .collect();
        Self { fish }
    }

    pub fn from_seed(seed: u64, config: &FishConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::spawn(&mut rng, config)
    }

    pub fn len(&self) -> usize {
        self.fish.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fish.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Fish> {
        self.fish.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fish> {
        self.fish.iter()
    }

    pub fn visible_count(&self) -> usize {
        self.fish.iter().filter(|fish| fish.visible).count()
    }

    /// Show fish with index below `threshold` and hide the rest.
    ///
    /// Returns how many visibility flags changed.
    pub fn set_visible_count(&mut self, threshold: usize) -> usize {
        let mut changed = 0;
        for (index, fish) in self.fish.iter_mut().enumerate() {
            let visible = index < threshold;
            if fish.visible != visible {
                fish.visible = visible;
                changed += 1;
            }
        }
        changed
    }

    /// Scale every fish's creation speed by `multiplier`
    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        for fish in &mut self.fish {
            fish.speed = fish.base_speed * multiplier;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within(value: f32, [min, max]: [f32; 2]) -> bool {
        value >= min && value <= max
    }

    #[test]
    fn test_seeded_school_respects_ranges() {
        let config = FishConfig::default();
        let school = School::from_seed(42, &config);
        assert_eq!(school.len(), 500);

        for fish in school.iter() {
            assert!(within(fish.speed, config.speed));
            assert!(within(fish.scale, config.scale));
            assert!(within(fish.position[0], config.x));
            assert!(within(fish.position[1], config.y));
            assert_eq!(fish.position[2], 0.0);
            assert_eq!(fish.speed, fish.base_speed);
            assert_eq!(fish.rotation, config.rotation);
        }
    }

    #[test]
    fn test_same_seed_same_school() {
        let config = FishConfig::default();
        let a = School::from_seed(9, &config);
        let b = School::from_seed(9, &config);
        assert!(a.iter().zip(b.iter()).all(|(x, y)| x == y));
    }

    #[test]
    fn test_degenerate_range_samples_its_bound() {
        let config = FishConfig {
            max: 3,
            speed: [0.01, 0.01],
            ..FishConfig::default()
        };
        let school = School::from_seed(1, &config);
        assert!(school.iter().all(|fish| fish.speed == 0.01));
    }

    #[test]
    fn test_visible_count_only_writes_differences() {
        let config = FishConfig {
            max: 10,
            ..FishConfig::default()
        };
        let mut school = School::from_seed(3, &config);

        assert_eq!(school.set_visible_count(4), 6);
        assert_eq!(school.visible_count(), 4);
        assert_eq!(school.set_visible_count(4), 0);
        assert_eq!(school.set_visible_count(100), 6);
        assert_eq!(school.visible_count(), 10);
    }

    #[test]
    fn test_speed_multiplier_does_not_compound() {
        let config = FishConfig {
            max: 20,
            ..FishConfig::default()
        };
        let mut school = School::from_seed(5, &config);

        school.set_speed_multiplier(2.0);
        school.set_speed_multiplier(3.0);
        for fish in school.iter() {
            assert_eq!(fish.speed, fish.base_speed * 3.0);
        }
    }
}
