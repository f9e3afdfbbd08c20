use crate::camera::{FreeCamera, OrbitCamera};
use crate::scene::{self, ObjectId, Scene};

const MOUSE_SENSITIVITY: f32 = 0.01;
const PLAYER_SPEED: f32 = 2.5;
const FLY_SPEED: f32 = 10.0;
const RADIUS_SPEED: f32 = 4.0;
/// Avatar turn rate, degrees per second (3 degrees per frame at 60 fps).
const TURN_SPEED: f32 = 180.0;

const DEFAULT_RADIUS: f32 = 4.0;
const DEFAULT_PITCH: f32 = 0.3;
const INITIAL_HEADING: f32 = 90.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum CameraMode {
    Follow,
    Free,
}

/// Maps per-frame input onto the camera pair and, in follow mode, the player
/// avatar the orbit camera anchors to.
#[derive(Debug, Copy, Clone)]
pub struct ClientCamera {
    mode: CameraMode,
    orbit: OrbitCamera,
    free: FreeCamera,
    heading: scene::Heading,
}

impl ClientCamera {
    const PLAYER_KEYS: [winit::event::VirtualKeyCode; 4] = [
        winit::event::VirtualKeyCode::W,
        winit::event::VirtualKeyCode::S,
        winit::event::VirtualKeyCode::A,
        winit::event::VirtualKeyCode::D,
    ];

    const FLY_KEYS: [winit::event::VirtualKeyCode; 6] = [
        winit::event::VirtualKeyCode::W,
        winit::event::VirtualKeyCode::S,
        winit::event::VirtualKeyCode::D,
        winit::event::VirtualKeyCode::A,
        winit::event::VirtualKeyCode::Space,
        winit::event::VirtualKeyCode::LShift,
    ];

    pub fn new(anchor: uv::Vec3) -> Self {
        let orbit = OrbitCamera::new(anchor, 0.0, DEFAULT_PITCH, DEFAULT_RADIUS);
        Self {
            mode: CameraMode::Follow,
            free: FreeCamera::new(orbit.pos(), 0.0, 0.0),
            orbit,
            heading: scene::Heading::new(INITIAL_HEADING),
        }
    }

    pub fn update(&mut self, state: &super::window::ClientState, scene: &mut Scene) {
        if state.key_pressed(winit::event::VirtualKeyCode::Tab) {
            self.toggle_mode()
        }

        let dt = state.frame_elapsed().as_secs_f32();
        let look = uv::Vec2::new(state.mouse_rel().x, -state.mouse_rel().y) * MOUSE_SENSITIVITY;

        match self.mode {
            CameraMode::Follow => {
                self.orbit.update_orientation(look);
                self.orbit.update_zoom(state.scroll_rel());
                self.orbit.update_radius(
                    state.key_axis(
                        winit::event::VirtualKeyCode::E,
                        winit::event::VirtualKeyCode::Q,
                    ) * RADIUS_SPEED
                        * dt,
                );
                self.update_player(state, scene, dt)
            }
            CameraMode::Free => {
                self.free.update_orientation(look);
                self.free.update_zoom(state.scroll_rel());
                self.free
                    .translate(state.move_vec(&Self::FLY_KEYS), FLY_SPEED * dt)
            }
        }
    }

    fn update_player(&mut self, state: &super::window::ClientState, scene: &mut Scene, dt: f32) {
        let keys = uv::Vec2::new(
            state.key_axis(Self::PLAYER_KEYS[3], Self::PLAYER_KEYS[2]),
            state.key_axis(Self::PLAYER_KEYS[0], Self::PLAYER_KEYS[1]),
        );
        if let Some(target) = scene::target_heading(keys) {
            self.heading.step_toward(target, TURN_SPEED * dt)
        }

        let player = match scene.get_mut(ObjectId::Player) {
            Some(player) => player,
            None => return,
        };

        if keys.mag_sq() > 0.0 {
            // key axes rotated into world space by the camera yaw
            let yaw = self.orbit.yaw();
            let forward = uv::Vec3::new(-yaw.sin(), 0.0, -yaw.cos());
            let right = uv::Vec3::new(yaw.cos(), 0.0, -yaw.sin());
            let dir = (right * keys.x + forward * keys.y).normalized();
            player.position += dir * PLAYER_SPEED * dt
        }
        player.rotation = self.orbit.yaw() + self.heading.radians();

        self.orbit.set_anchor(player.position)
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            CameraMode::Follow => {
                // seed the fly-through from the current orbit pose, facing
                // the anchor: front = -offset
                let yaw = self.orbit.yaw();
                self.free = FreeCamera::new(
                    self.orbit.pos(),
                    (-yaw.cos()).atan2(-yaw.sin()),
                    -self.orbit.pitch(),
                );
                CameraMode::Free
            }
            CameraMode::Free => CameraMode::Follow,
        }
    }

    pub fn look_mat(&self) -> uv::Mat4 {
        match self.mode {
            CameraMode::Follow => self.orbit.look_mat(),
            CameraMode::Free => self.free.look_mat(),
        }
    }

    pub fn zoom(&self) -> f32 {
        match self.mode {
            CameraMode::Follow => self.orbit.zoom(),
            CameraMode::Free => self.free.zoom(),
        }
    }
}
