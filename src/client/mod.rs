mod camera;
mod window;

use crate::scene::{Model, ObjectId, Scene};
use crate::vk;
use crate::vk::Instance;

const PLAYER_MODEL: &str = "assets/models/player/scene.gltf";
const CUBE_MODEL: &str = "assets/models/cube/scene.gltf";

pub fn run() -> ! {
    let event_loop = winit::event_loop::EventLoop::new();
    let window = window::ClientWindow::new(&event_loop).unwrap_or_else(|e| fatal(&e));

    let player_model = Model::import(PLAYER_MODEL).unwrap_or_else(|e| fatal(&e));
    let cube_model = Model::import(CUBE_MODEL).unwrap_or_else(|e| fatal(&e));

    let render_instance = vk::WindowedInstance::new(window.window(), cfg!(debug_assertions))
        .unwrap_or_else(|e| fatal(&e));
    let mut render_surface = vk::Swapchain::new(render_instance.clone(), window.size().into());
    let mut model_renderer = vk::ModelRenderer::new(render_instance.clone(), &render_surface);
    let mut model_manager = vk::ModelManager::new(render_instance.clone());

    model_manager.upload_model(ObjectId::Player, &player_model);
    model_manager.upload_model(ObjectId::Cube, &cube_model);
    log::info!("uploaded {} meshes", model_manager.mesh_count());

    let mut scene = Scene::demo();
    let mut camera = camera::ClientCamera::new(uv::Vec3::zero());

    window.run(event_loop, move |window, state| {
        if state.quit() {
            render_instance.wait_idle();
            return;
        }
        camera.update(state, &mut scene);
        log::trace!("{:?}", camera);
        if !render_surface.render(|command_buffer| {
            model_renderer.render(
                command_buffer,
                &model_manager,
                &scene,
                camera.look_mat(),
                camera.zoom(),
            );
        }) {
            render_instance.wait_idle();
            render_surface.rebuild(window.size().into());
            model_renderer.rebuild(&render_surface);
        }
    });
}

fn fatal(err: &dyn std::fmt::Display) -> ! {
    log::error!("{}", err);
    std::process::exit(1)
}
