mod camera;
mod client;
mod scene;
mod vk;

fn main() {
    env_logger::init();
    client::run()
}
