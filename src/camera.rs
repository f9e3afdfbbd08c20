pub const MIN_PITCH: f32 = -1.0;
pub const MAX_PITCH: f32 = 1.0;
pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 45.0;
pub const MIN_RADIUS: f32 = 1.0;

const WORLD_UP: uv::Vec3 = uv::Vec3::new(0.0, 1.0, 0.0);

/// Follow camera: orbits an anchor point at a fixed radius, always looking
/// at it. `pos` is derived state, recomputed on every mutation so it never
/// drifts from the yaw/pitch/radius it was computed from.
#[derive(Debug, Copy, Clone)]
pub struct OrbitCamera {
    pos: uv::Vec3,
    anchor: uv::Vec3,
    yaw: f32,
    pitch: f32,
    radius: f32,
    zoom: f32,
}

/// Free-fly camera: yaw/pitch drive an orthonormal front/right/up basis,
/// recomputed on every mutation.
#[derive(Debug, Copy, Clone)]
pub struct FreeCamera {
    pub pos: uv::Vec3,
    front: uv::Vec3,
    right: uv::Vec3,
    up: uv::Vec3,
    yaw: f32,
    pitch: f32,
    zoom: f32,
}

impl OrbitCamera {
    pub fn new(anchor: uv::Vec3, yaw: f32, pitch: f32, radius: f32) -> Self {
        let mut camera = Self {
            pos: anchor,
            anchor,
            yaw,
            pitch: pitch.clamp(MIN_PITCH, MAX_PITCH),
            radius: radius.max(MIN_RADIUS),
            zoom: MAX_ZOOM,
        };
        camera.update_position();
        camera
    }

    /// Spherical anchor-to-camera offset for the current yaw/pitch/radius.
    pub fn offset(&self) -> uv::Vec3 {
        uv::Vec3::new(
            self.radius * self.yaw.sin(),
            self.radius * self.pitch.sin(),
            self.radius * self.yaw.cos(),
        )
    }

    pub fn look_mat(&self) -> uv::Mat4 {
        uv::Mat4::look_at(self.pos, self.anchor, WORLD_UP)
    }

    pub fn update_orientation(&mut self, d: uv::Vec2) {
        self.yaw = (self.yaw + d.x).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + d.y).clamp(MIN_PITCH, MAX_PITCH);
        self.update_position()
    }

    pub fn update_zoom(&mut self, d: f32) {
        self.zoom = (self.zoom - d).clamp(MIN_ZOOM, MAX_ZOOM)
    }

    pub fn update_radius(&mut self, d: f32) {
        // floored so the camera never collapses onto the anchor
        self.radius = (self.radius + d).max(MIN_RADIUS);
        self.update_position()
    }

    pub fn set_anchor(&mut self, anchor: uv::Vec3) {
        self.anchor = anchor;
        self.update_position()
    }

    fn update_position(&mut self) {
        self.pos = self.anchor + self.offset()
    }

    pub fn pos(&self) -> uv::Vec3 {
        self.pos
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }
}

impl FreeCamera {
    pub fn new(pos: uv::Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            pos,
            front: uv::Vec3::new(0.0, 0.0, -1.0),
            right: uv::Vec3::new(1.0, 0.0, 0.0),
            up: WORLD_UP,
            yaw,
            pitch: pitch.clamp(MIN_PITCH, MAX_PITCH),
            zoom: MAX_ZOOM,
        };
        camera.update_basis();
        camera
    }

    pub fn look_mat(&self) -> uv::Mat4 {
        uv::Mat4::look_at(self.pos, self.pos + self.front, self.up)
    }

    pub fn update_orientation(&mut self, d: uv::Vec2) {
        self.yaw = (self.yaw + d.x).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + d.y).clamp(MIN_PITCH, MAX_PITCH);
        self.update_basis()
    }

    pub fn update_zoom(&mut self, d: f32) {
        self.zoom = (self.zoom - d).clamp(MIN_ZOOM, MAX_ZOOM)
    }

    /// Translate along the camera basis: `v.x` forward, `v.y` right,
    /// `v.z` world-up.
    pub fn translate(&mut self, v: uv::Vec3, distance: f32) {
        self.pos += (self.front * v.x + self.right * v.y + WORLD_UP * v.z) * distance
    }

    fn update_basis(&mut self) {
        self.front = uv::Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalized();
        self.right = self.front.cross(WORLD_UP).normalized();
        self.up = self.right.cross(self.front).normalized()
    }

    pub fn front(&self) -> uv::Vec3 {
        self.front
    }

    pub fn right(&self) -> uv::Vec3 {
        self.right
    }

    pub fn up(&self) -> uv::Vec3 {
        self.up
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_near(a: uv::Vec3, b: uv::Vec3) {
        assert!((a - b).mag() < 1e-4, "expected {:?} to be near {:?}", a, b)
    }

    #[test]
    fn offset_follows_spherical_formula() {
        for &yaw in &[0.0f32, 0.4, 1.3, 2.9, -0.7, 6.0] {
            for &pitch in &[-1.0f32, -0.5, 0.0, 0.3, 1.0] {
                let camera = OrbitCamera::new(uv::Vec3::zero(), yaw, pitch, 6.0);
                assert_vec3_near(
                    camera.offset(),
                    uv::Vec3::new(6.0 * yaw.sin(), 6.0 * pitch.sin(), 6.0 * yaw.cos()),
                )
            }
        }
    }

    #[test]
    fn offset_scenarios() {
        let camera = OrbitCamera::new(uv::Vec3::zero(), 0.0, 0.0, 6.0);
        assert_vec3_near(camera.offset(), uv::Vec3::new(0.0, 0.0, 6.0));

        let camera = OrbitCamera::new(uv::Vec3::zero(), std::f32::consts::FRAC_PI_2, 0.0, 6.0);
        assert_vec3_near(camera.offset(), uv::Vec3::new(6.0, 0.0, 0.0))
    }

    #[test]
    fn position_tracks_anchor() {
        let mut camera = OrbitCamera::new(uv::Vec3::zero(), 0.0, 0.0, 4.0);
        camera.set_anchor(uv::Vec3::new(10.0, 1.0, -2.0));
        assert_vec3_near(camera.pos(), uv::Vec3::new(10.0, 1.0, 2.0))
    }

    #[test]
    fn pitch_pins_at_bounds() {
        let mut camera = OrbitCamera::new(uv::Vec3::zero(), 0.0, 0.9, 4.0);
        camera.update_orientation(uv::Vec2::new(0.0, 5.0));
        assert_eq!(camera.pitch(), MAX_PITCH);
        camera.update_orientation(uv::Vec2::new(0.0, -100.0));
        assert_eq!(camera.pitch(), MIN_PITCH);
        camera.update_orientation(uv::Vec2::new(0.0, 0.25));
        assert!((camera.pitch() - (MIN_PITCH + 0.25)).abs() < 1e-6)
    }

    #[test]
    fn zoom_stays_in_range() {
        let mut camera = OrbitCamera::new(uv::Vec3::zero(), 0.0, 0.0, 4.0);
        for &d in &[3.0f32, -10.0, 100.0, -0.5, 47.0, -200.0, 1.0] {
            camera.update_zoom(d);
            assert!(camera.zoom() >= MIN_ZOOM && camera.zoom() <= MAX_ZOOM)
        }
        camera.update_zoom(1000.0);
        assert_eq!(camera.zoom(), MIN_ZOOM);
        camera.update_zoom(-1000.0);
        assert_eq!(camera.zoom(), MAX_ZOOM)
    }

    #[test]
    fn radius_floor() {
        let mut camera = OrbitCamera::new(uv::Vec3::zero(), 0.0, 0.0, 4.0);
        camera.update_radius(-100.0);
        assert_eq!(camera.radius(), MIN_RADIUS)
    }

    #[test]
    fn zero_delta_update_is_idempotent() {
        let mut camera = OrbitCamera::new(uv::Vec3::new(1.0, 2.0, 3.0), 0.8, 0.2, 5.0);
        let pos = camera.pos();
        let look = camera.look_mat();
        camera.update_orientation(uv::Vec2::zero());
        camera.update_zoom(0.0);
        camera.update_radius(0.0);
        assert_vec3_near(camera.pos(), pos);
        let look_after = camera.look_mat();
        for i in 0..4 {
            assert_vec3_near(look.cols[i].xyz(), look_after.cols[i].xyz())
        }
    }

    #[test]
    fn free_basis_stays_orthonormal() {
        let mut camera = FreeCamera::new(uv::Vec3::zero(), -std::f32::consts::FRAC_PI_2, 0.0);
        for &d in &[
            uv::Vec2::new(0.3, 0.1),
            uv::Vec2::new(-2.0, 0.9),
            uv::Vec2::new(5.0, -3.0),
        ] {
            camera.update_orientation(d);
            assert!((camera.front().mag() - 1.0).abs() < 1e-4);
            assert!((camera.right().mag() - 1.0).abs() < 1e-4);
            assert!((camera.up().mag() - 1.0).abs() < 1e-4);
            assert!(camera.front().dot(camera.right()).abs() < 1e-4);
            assert!(camera.front().dot(camera.up()).abs() < 1e-4);
            assert!(camera.right().dot(camera.up()).abs() < 1e-4)
        }
    }

    #[test]
    fn free_translate_moves_along_basis() {
        let mut camera = FreeCamera::new(uv::Vec3::zero(), 0.0, 0.0);
        // yaw 0 looks down +x
        camera.translate(uv::Vec3::new(1.0, 0.0, 0.0), 2.0);
        assert_vec3_near(camera.pos, uv::Vec3::new(2.0, 0.0, 0.0));
        camera.translate(uv::Vec3::new(0.0, 0.0, 1.0), 3.0);
        assert_vec3_near(camera.pos, uv::Vec3::new(2.0, 3.0, 0.0))
    }
}
