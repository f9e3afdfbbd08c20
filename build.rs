use std::io::Write;

const SHADER_DIRNAME: &str = "assets/shaders";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", SHADER_DIRNAME);
    let out_dirname = std::env::var("OUT_DIR")?;
    std::fs::create_dir_all(&out_dirname)?;

    let mut compiler = shaderc::Compiler::new().ok_or("failed to create shaderc compiler")?;

    for entry in std::fs::read_dir(SHADER_DIRNAME)? {
        let in_path = entry?.path();
        let kind = match in_path.extension().map(|ext| ext.to_string_lossy()) {
            Some(ext) if ext == "vert" => shaderc::ShaderKind::Vertex,
            Some(ext) if ext == "frag" => shaderc::ShaderKind::Fragment,
            _ => continue,
        };
        let in_filename = in_path
            .file_name()
            .ok_or("shader path has no file name")?
            .to_string_lossy();
        let out_path = format!("{}/{}.spv", out_dirname, in_filename);
        println!("Compiling {} into {}", in_path.display(), &out_path);

        let source = std::fs::read_to_string(&in_path)?;
        let spirv = compiler.compile_into_spirv(&source, kind, &in_filename, "main", None)?;
        std::fs::File::create(&out_path)?.write_all(spirv.as_binary_u8())?;
    }
    Ok(())
}
