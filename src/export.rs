use ico::{IconDir, IconDirEntry, IconImage, ResourceType};
use image::RgbaImage;
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::models::{IconSpec, OutputFile};
use crate::render::resize_premultiplied;
use crate::utils::calculate_hash;

/// Writes a single PNG, replacing any existing file.
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Writes all `images` into one multi-resolution ICO file, in the given order.
pub fn write_ico(images: &[RgbaImage], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut icon_dir = IconDir::new(ResourceType::Icon);
    for image in images {
        let icon_image = IconImage::from_rgba_data(image.width(), image.height(), image.as_raw().clone());
        icon_dir.add_entry(IconDirEntry::encode(&icon_image)?);
    }
    let file = BufWriter::new(File::create(path)?);
    icon_dir.write(file)?;
    Ok(())
}

/// Records a written file with its digest, so repeated runs can be compared byte for byte.
fn describe(path: &Path, width: u32, height: u32) -> Result<OutputFile, Box<dyn std::error::Error>> {
    Ok(OutputFile {
        path: path.to_path_buf(),
        width,
        height,
        sha256: calculate_hash(path)?,
    })
}

/// Exports every configured size as PNG, then bundles the same copies into the ICO.
/// Stops at the first failure; files already written are left in place.
pub fn export_all(
    spec: &IconSpec,
    canvas: &RgbaImage,
    dir: &Path,
) -> Result<Vec<OutputFile>, Box<dyn std::error::Error>> {
    let mut outputs = Vec::with_capacity(spec.sizes.len() + 1);
    let mut copies = Vec::with_capacity(spec.sizes.len());

    for &size in &spec.sizes {
        let resized = resize_premultiplied(canvas, size);
        let path = dir.join(spec.png_file_name(size));
        write_png(&resized, &path)?;
        info!("Wrote {}", path.display());
        outputs.push(describe(&path, size, size)?);
        copies.push(resized);
    }

    let ico_path = dir.join(spec.ico_file_name());
    write_ico(&copies, &ico_path)?;
    info!("Wrote {} ({} sizes)", ico_path.display(), copies.len());
    let largest = copies.iter().map(|c| c.width()).max().unwrap_or(0);
    outputs.push(describe(&ico_path, largest, largest)?);

    Ok(outputs)
}
