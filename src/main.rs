mod export;
mod glyph;
mod models;
mod render;
mod utils;

use chrono::Local;
use log::info;
use std::env;
use std::io::Write;
use std::path::Path;

use crate::export::export_all;
use crate::glyph::GlyphRenderer;
use crate::models::{GenerationReport, IconSpec};
use crate::render::render_base;

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Draws the icon described by `spec` and writes every export into `dir`.
pub fn generate_icon_in(dir: &Path, spec: &IconSpec) -> Result<GenerationReport, Box<dyn std::error::Error>> {
    let glyphs = GlyphRenderer::load(&spec.font_name, spec.font_size);
    let canvas = render_base(spec, &glyphs);
    let outputs = export_all(spec, &canvas, dir)?;
    Ok(GenerationReport {
        generated_at: Local::now(),
        font: glyphs.source(),
        outputs,
    })
}

/// Generates the fixed icon set into the current working directory.
pub fn generate_icon() -> Result<GenerationReport, Box<dyn std::error::Error>> {
    generate_icon_in(&env::current_dir()?, &IconSpec::default())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let report = generate_icon()?;
    info!("Generated {} files", report.outputs.len());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
