//! Interaction commands and control value parsing
//!
//! Every control (egui widget or host-page element) is reduced to an
//! [`AquariumCommand`] which the scene applies at the start of a frame.

use std::fmt;

/// A state mutation requested by the interaction layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AquariumCommand {
    /// Fish with index below the threshold are shown
    SetVisibleFish(usize),
    SetSpeedMultiplier(f32),
    ToggleSquid,
    ToggleBackground,
    /// Intensity applied to every spotlight
    SetLightIntensity(f32),
    ToggleMirror,
}

/// The three range controls, in page order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliderKind {
    FishCount,
    Speed,
    LightIntensity,
}

impl SliderKind {
    pub const ALL: [SliderKind; 3] = [
        SliderKind::FishCount,
        SliderKind::Speed,
        SliderKind::LightIntensity,
    ];

    /// Position of the control among the page's `.slide` inputs
    pub fn index(self) -> usize {
        match self {
            SliderKind::FishCount => 0,
            SliderKind::Speed => 1,
            SliderKind::LightIntensity => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            SliderKind::FishCount => "Fish",
            SliderKind::Speed => "Speed",
            SliderKind::LightIntensity => "Light",
        }
    }

    /// Build the command for a raw control value.
    ///
    /// The count is read as an integer and the others as floats; `None` when
    /// the value has no numeric prefix.
    pub fn parse(self, value: &str) -> Option<AquariumCommand> {
        match self {
            SliderKind::FishCount => {
                let count = parse_int(value)?;
                Some(AquariumCommand::SetVisibleFish(
                    usize::try_from(count.max(0)).unwrap_or(usize::MAX),
                ))
            }
            SliderKind::Speed => parse_float(value).map(AquariumCommand::SetSpeedMultiplier),
            SliderKind::LightIntensity => {
                parse_float(value).map(AquariumCommand::SetLightIntensity)
            }
        }
    }
}

impl fmt::Display for SliderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The toggle buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonKind {
    Squid,
    Background,
    Mirror,
}

impl ButtonKind {
    pub const ALL: [ButtonKind; 3] = [ButtonKind::Squid, ButtonKind::Background, ButtonKind::Mirror];

    /// Host-page element id
    pub fn element_id(self) -> &'static str {
        match self {
            ButtonKind::Squid => "onSquid",
            ButtonKind::Background => "onBackground",
            ButtonKind::Mirror => "onMirror",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ButtonKind::Squid => "Squid",
            ButtonKind::Background => "Background",
            ButtonKind::Mirror => "Mirror",
        }
    }

    pub fn command(self) -> AquariumCommand {
        match self {
            ButtonKind::Squid => AquariumCommand::ToggleSquid,
            ButtonKind::Background => AquariumCommand::ToggleBackground,
            ButtonKind::Mirror => AquariumCommand::ToggleMirror,
        }
    }
}

/// Leading integer of `value`, ignoring anything after the digits
pub fn parse_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let digits_start = usize::from(trimmed.starts_with(['+', '-']));
    let digits_len = trimmed[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }

    let literal = &trimmed[..digits_start + digits_len];
    match literal.parse::<i64>() {
        Ok(number) => Some(number),
        Err(_) if literal.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

/// Longest leading decimal literal of `value` as a finite float
pub fn parse_float(value: &str) -> Option<f32> {
    let trimmed = value.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = usize::from(trimmed.starts_with(['+', '-']));

    let integer_digits = count_digits(&bytes[end..]);
    end += integer_digits;

    let mut fraction_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction_digits = count_digits(&bytes[end + 1..]);
        if integer_digits > 0 || fraction_digits > 0 {
            end += 1 + fraction_digits;
        }
    }
    if integer_digits == 0 && fraction_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent_digits = count_digits(&bytes[(end + 1 + sign).min(bytes.len())..]);
        if exponent_digits > 0 {
            end += 1 + sign + exponent_digits;
        }
    }

    trimmed[..end]
        .parse::<f32>()
        .ok()
        .filter(|number| number.is_finite())
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int("250"), Some(250));
        assert_eq!(parse_int("  42px"), Some(42));
        assert_eq!(parse_int("-3"), Some(-3));
        assert_eq!(parse_int("3.9"), Some(3));
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-"), None);
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("2."), Some(2.0));
        assert_eq!(parse_float("1e2x"), Some(100.0));
        assert_eq!(parse_float("3e"), Some(3.0));
        assert_eq!(parse_float(" -0.25 "), Some(-0.25));
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("Infinity"), None);
        assert_eq!(parse_float("1e999"), None);
    }

    #[test]
    fn test_slider_commands() {
        assert_eq!(
            SliderKind::FishCount.parse("120"),
            Some(AquariumCommand::SetVisibleFish(120))
        );
        assert_eq!(
            SliderKind::FishCount.parse("-5"),
            Some(AquariumCommand::SetVisibleFish(0))
        );
        assert_eq!(
            SliderKind::Speed.parse("2.5"),
            Some(AquariumCommand::SetSpeedMultiplier(2.5))
        );
        assert_eq!(
            SliderKind::LightIntensity.parse("0"),
            Some(AquariumCommand::SetLightIntensity(0.0))
        );
        assert_eq!(SliderKind::Speed.parse("fast"), None);
    }

    #[test]
    fn test_slider_indices_match_page_order() {
        for (index, kind) in SliderKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), index);
            assert_eq!(SliderKind::from_index(index), Some(*kind));
        }
        assert_eq!(SliderKind::from_index(3), None);
    }

    #[test]
    fn test_button_ids() {
        let ids: Vec<_> = ButtonKind::ALL.iter().map(|b| b.element_id()).collect();
        assert_eq!(ids, ["onSquid", "onBackground", "onMirror"]);
        assert_eq!(ButtonKind::Mirror.command(), AquariumCommand::ToggleMirror);
    }
}
