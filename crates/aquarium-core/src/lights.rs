//! Spotlight layout

/// Positions for a line of `count` spotlights along Z.
///
/// Index 0 sits at the center; odd indices step backward (-Z) and even
/// indices step forward (+Z), each pair one `spacing` further out.
pub fn spotlight_positions(count: usize, height: f32, spacing: f32) -> Vec<[f32; 3]> {
    let mut positions = Vec::with_capacity(count);
    let mut step = 1.0;
    for index in 0..count {
        let z = if index == 0 {
            0.0
        } else if index % 2 == 1 {
            -spacing * step
        } else {
            let z = spacing * step;
            step += 1.0;
            z
        };
        positions.push([0.0, height, z]);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seven_spotlights() {
        let z: Vec<f32> = spotlight_positions(7, 5.0, 10.0)
            .iter()
            .map(|p| p[2])
            .collect();
        assert_eq!(z, [0.0, -10.0, 10.0, -20.0, 20.0, -30.0, 30.0]);
    }

    #[test]
    fn test_height_and_count() {
        let positions = spotlight_positions(2, 3.5, 4.0);
        assert_eq!(positions, vec![[0.0, 3.5, 0.0], [0.0, 3.5, -4.0]]);
        assert!(spotlight_positions(0, 5.0, 10.0).is_empty());
    }
}
