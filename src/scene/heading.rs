/// Avatar facing angle in degrees, kept in (0, 360].
///
/// The avatar does not snap to its movement direction; it turns toward it a
/// bounded step per frame. Targets use 360 rather than 0 for "east" so that
/// numeric stepping between neighboring targets never has to wrap.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Heading(f32);

impl Heading {
    pub fn new(degrees: f32) -> Self {
        Self(degrees)
    }

    pub fn degrees(&self) -> f32 {
        self.0
    }

    pub fn radians(&self) -> f32 {
        self.0.to_radians()
    }

    /// Step toward `target` by at most `step` degrees, pinning exactly on
    /// arrival.
    pub fn step_toward(&mut self, target: f32, step: f32) {
        let d = target - self.0;
        if d.abs() <= step {
            self.0 = target
        } else {
            self.0 += step.copysign(d)
        }
    }
}

/// Target heading for a composed movement direction, or `None` when the
/// avatar is idle. `dir.x` is the east/west axis, `dir.y` north/south.
///
/// A single `atan2` over the composed vector covers every key combination
/// the old per-key branching enumerated: E 360, NE 45, N 90, NW 135, W 180,
/// SW 225, S 270, SE 315.
pub fn target_heading(dir: uv::Vec2) -> Option<f32> {
    if dir.mag_sq() < 1e-6 {
        return None;
    }
    let degrees = dir.y.atan2(dir.x).to_degrees();
    Some(if degrees <= 0.0 { degrees + 360.0 } else { degrees })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_vec(w: bool, a: bool, s: bool, d: bool) -> uv::Vec2 {
        uv::Vec2::new(
            (d as i32 - a as i32) as f32,
            (w as i32 - s as i32) as f32,
        )
    }

    #[test]
    fn angle_table() {
        // (w, a, s, d) -> target degrees
        let table = [
            ((true, false, false, false), 90.0),
            ((false, true, false, false), 180.0),
            ((false, false, true, false), 270.0),
            ((false, false, false, true), 360.0),
            ((true, false, false, true), 45.0),
            ((true, true, false, false), 135.0),
            ((false, true, true, false), 225.0),
            ((false, false, true, true), 315.0),
        ];
        for &((w, a, s, d), expected) in &table {
            let target = target_heading(key_vec(w, a, s, d)).unwrap();
            assert!(
                (target - expected).abs() < 1e-4,
                "keys {:?} -> {}, expected {}",
                (w, a, s, d),
                target,
                expected
            )
        }
    }

    #[test]
    fn idle_and_cancelling_keys_give_no_target() {
        assert_eq!(target_heading(key_vec(false, false, false, false)), None);
        assert_eq!(target_heading(key_vec(true, false, true, false)), None);
        assert_eq!(target_heading(key_vec(false, true, false, true)), None)
    }

    #[test]
    fn stepping_converges_and_pins() {
        let mut heading = Heading::new(90.0);
        for _ in 0..15 {
            heading.step_toward(45.0, 3.0)
        }
        assert_eq!(heading.degrees(), 45.0);

        // 15 steps of 3 cover exactly the 45 degree gap
        let mut heading = Heading::new(90.0);
        for _ in 0..14 {
            heading.step_toward(45.0, 3.0)
        }
        assert!(heading.degrees() > 45.0)
    }

    #[test]
    fn stepping_direction_matches_sign_of_gap() {
        let mut heading = Heading::new(90.0);
        heading.step_toward(180.0, 3.0);
        assert_eq!(heading.degrees(), 93.0);
        heading.step_toward(45.0, 3.0);
        assert_eq!(heading.degrees(), 90.0)
    }

    #[test]
    fn step_at_target_is_a_noop() {
        let mut heading = Heading::new(270.0);
        heading.step_toward(270.0, 3.0);
        assert_eq!(heading.degrees(), 270.0)
    }
}
