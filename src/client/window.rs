pub struct ClientWindow {
    window: winit::window::Window,
}

pub struct ClientState {
    main: bool,
    quit: bool,

    time: std::time::Instant,
    frame_elapsed: std::time::Duration,

    mouse_rel: uv::Vec2,
    scroll_rel: f32,

    key_held: [bool; 255],
    key_pressed: [bool; 255],
}

impl ClientWindow {
    pub fn new(
        event_loop: &winit::event_loop::EventLoop<()>,
    ) -> Result<Self, winit::error::OsError> {
        let window = winit::window::WindowBuilder::new()
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800))
            .with_title("gltf render demo")
            .build(event_loop)?;

        // some window managers refuse the grab; mouse look still works
        if let Err(e) = window.set_cursor_grab(true) {
            log::warn!("cursor grab unavailable: {}", e)
        }
        window.set_cursor_visible(false);

        Ok(Self { window })
    }

    pub fn window(&self) -> &winit::window::Window {
        &self.window
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.window.inner_size()
    }

    pub fn run<Fn: 'static + FnMut(&Self, &ClientState)>(
        self,
        event_loop: winit::event_loop::EventLoop<()>,
        mut frame_handler: Fn,
    ) -> ! {
        let mut state = ClientState::new();
        event_loop.run(move |event, _, control_flow| {
            state.handle_event(event);
            if state.quit() {
                *control_flow = winit::event_loop::ControlFlow::Exit
            }
            if state.main() {
                frame_handler(&self, &state);
                state.reset()
            }
        })
    }
}

impl ClientState {
    pub fn new() -> Self {
        Self {
            main: false,
            quit: false,
            time: std::time::Instant::now(),
            frame_elapsed: Default::default(),
            mouse_rel: uv::Vec2::zero(),
            scroll_rel: 0.0,
            key_held: [false; 255],
            key_pressed: [false; 255],
        }
    }

    pub fn handle_event(&mut self, event: winit::event::Event<()>) {
        match event {
            winit::event::Event::MainEventsCleared => {
                let new_time = std::time::Instant::now();
                self.frame_elapsed = new_time - self.time;
                self.time = new_time;
                self.main = true
            }
            winit::event::Event::LoopDestroyed => self.quit = true,
            winit::event::Event::WindowEvent { event, .. } => match event {
                winit::event::WindowEvent::Destroyed
                | winit::event::WindowEvent::CloseRequested => self.quit = true,
                winit::event::WindowEvent::KeyboardInput { input, .. } => {
                    if let Some(keycode) = input.virtual_keycode {
                        self.key_event(
                            keycode,
                            input.state == winit::event::ElementState::Pressed,
                        )
                    }
                }
                winit::event::WindowEvent::MouseWheel { delta, .. } => {
                    self.scroll_event(match delta {
                        winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                        winit::event::MouseScrollDelta::PixelDelta(p) => p.y as f32 / 20.0,
                    })
                }
                _ => (),
            },
            winit::event::Event::DeviceEvent { event, .. } => {
                if let winit::event::DeviceEvent::MouseMotion { delta } = event {
                    self.mouse_event(uv::Vec2::new(delta.0 as f32, delta.1 as f32))
                }
            }
            _ => (),
        }
    }

    fn key_event(&mut self, key: winit::event::VirtualKeyCode, pressed: bool) {
        if key == winit::event::VirtualKeyCode::Escape && pressed {
            self.quit = true
        }
        if pressed && !self.key_held[key as usize] {
            self.key_pressed[key as usize] = true
        }
        self.key_held[key as usize] = pressed
    }

    fn scroll_event(&mut self, delta: f32) {
        self.scroll_rel += delta
    }

    fn mouse_event(&mut self, delta: uv::Vec2) {
        // several motion events may land within one frame
        self.mouse_rel += delta
    }

    /// Signed axis from a pair of held keys.
    pub fn key_axis(
        &self,
        positive: winit::event::VirtualKeyCode,
        negative: winit::event::VirtualKeyCode,
    ) -> f32 {
        (self.key_held(positive) as i32 - self.key_held(negative) as i32) as f32
    }

    /// Direction composed from three key-axis pairs, normalized so diagonal
    /// movement is no faster than straight movement.
    pub fn move_vec(&self, move_keys: &[winit::event::VirtualKeyCode; 6]) -> uv::Vec3 {
        let v = uv::Vec3::new(
            self.key_axis(move_keys[0], move_keys[1]),
            self.key_axis(move_keys[2], move_keys[3]),
            self.key_axis(move_keys[4], move_keys[5]),
        );
        if v.mag_sq() > 0.0 {
            v.normalized()
        } else {
            v
        }
    }

    pub fn reset(&mut self) {
        self.main = false;
        self.mouse_rel = uv::Vec2::zero();
        self.scroll_rel = 0.0;
        self.key_pressed = [false; 255]
    }

    fn main(&self) -> bool {
        self.main || self.quit
    }

    pub fn quit(&self) -> bool {
        self.quit
    }

    pub fn frame_elapsed(&self) -> std::time::Duration {
        self.frame_elapsed
    }

    pub fn mouse_rel(&self) -> uv::Vec2 {
        self.mouse_rel
    }

    pub fn scroll_rel(&self) -> f32 {
        self.scroll_rel
    }

    pub fn key_held(&self, key: winit::event::VirtualKeyCode) -> bool {
        self.key_held[key as usize]
    }

    pub fn key_pressed(&self, key: winit::event::VirtualKeyCode) -> bool {
        self.key_pressed[key as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::VirtualKeyCode;

    #[test]
    fn escape_sets_the_close_flag() {
        let mut state = ClientState::new();
        assert!(!state.quit());
        state.key_event(VirtualKeyCode::Escape, true);
        assert!(state.quit())
    }

    #[test]
    fn key_press_and_release_tracked() {
        let mut state = ClientState::new();
        state.key_event(VirtualKeyCode::W, true);
        assert!(state.key_held(VirtualKeyCode::W));
        assert!(state.key_pressed(VirtualKeyCode::W));
        state.reset();
        assert!(state.key_held(VirtualKeyCode::W));
        assert!(!state.key_pressed(VirtualKeyCode::W));
        state.key_event(VirtualKeyCode::W, false);
        assert!(!state.key_held(VirtualKeyCode::W))
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut state = ClientState::new();
        state.key_event(VirtualKeyCode::W, true);
        state.key_event(VirtualKeyCode::S, true);
        assert_eq!(state.key_axis(VirtualKeyCode::W, VirtualKeyCode::S), 0.0)
    }

    #[test]
    fn move_vec_is_normalized() {
        const KEYS: [VirtualKeyCode; 6] = [
            VirtualKeyCode::W,
            VirtualKeyCode::S,
            VirtualKeyCode::D,
            VirtualKeyCode::A,
            VirtualKeyCode::Space,
            VirtualKeyCode::LShift,
        ];
        let mut state = ClientState::new();
        assert_eq!(state.move_vec(&KEYS).mag(), 0.0);
        state.key_event(VirtualKeyCode::W, true);
        state.key_event(VirtualKeyCode::D, true);
        let v = state.move_vec(&KEYS);
        assert!((v.mag() - 1.0).abs() < 1e-5);
        assert!((v.x - v.y).abs() < 1e-5)
    }

    #[test]
    fn mouse_and_scroll_accumulate_until_reset() {
        let mut state = ClientState::new();
        state.mouse_event(uv::Vec2::new(1.0, -2.0));
        state.mouse_event(uv::Vec2::new(0.5, 0.5));
        state.scroll_event(1.0);
        state.scroll_event(-3.0);
        assert!((state.mouse_rel().x - 1.5).abs() < 1e-6);
        assert!((state.mouse_rel().y + 1.5).abs() < 1e-6);
        assert!((state.scroll_rel() + 2.0).abs() < 1e-6);
        state.reset();
        assert_eq!(state.mouse_rel().mag(), 0.0);
        assert_eq!(state.scroll_rel(), 0.0)
    }
}
