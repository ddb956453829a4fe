//! # Source Importers
//!
//! Thin adapters over the ecosystem decoders. They turn artist files into the
//! plain buffers the codecs in `kiln_assets` consume and know nothing about
//! containers.

use std::path::Path;

use kiln_assets::VertexPncvF32;

use crate::error::BakeResult;

/// A decoded image, always expanded to RGBA8.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

/// One sub-mesh of an imported model file.
#[derive(Clone, Debug)]
pub struct ImportedMesh {
    /// Object or group name from the source file.
    pub name: String,
    /// One vertex per unique position/normal/uv combination.
    pub vertices: Vec<VertexPncvF32>,
    /// Triangle list.
    pub indices: Vec<u32>,
}

/// Decodes any image format the `image` crate understands into RGBA8.
///
/// # Errors
///
/// Returns [`BakeError::Image`](crate::BakeError::Image) if the file cannot
/// be read or decoded.
pub fn decode_image(path: &Path) -> BakeResult<DecodedImage> {
    let rgba = image::open(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Imports a Wavefront OBJ, triangulated and with a single index stream.
///
/// Missing texture coordinates become `(0, 0)` and missing vertex colors
/// become white. V is flipped so textures are sampled top-down.
///
/// # Errors
///
/// Returns [`BakeError::Obj`](crate::BakeError::Obj) if the OBJ cannot be
/// parsed. A missing material library is not an error.
pub fn import_obj(path: &Path) -> BakeResult<Vec<ImportedMesh>> {
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, _materials) = tobj::load_obj(path, &load_options)?;

    Ok(models
        .into_iter()
        .map(|model| ImportedMesh {
            vertices: convert_vertices(&model.mesh),
            indices: model.mesh.indices,
            name: model.name,
        })
        .collect())
}

/// Imports every triangle primitive of a glTF 2.0 file (`.gltf` or `.glb`).
///
/// Each primitive becomes one [`ImportedMesh`] named after its mesh.
/// Primitives without positions, or drawn as points, lines or strips, are
/// skipped. Missing normals become zero and missing colors white. glTF UVs
/// already have their origin top-left, so V is kept as is.
///
/// # Errors
///
/// Returns [`BakeError::Gltf`](crate::BakeError::Gltf) if the document or
/// one of its buffers cannot be loaded.
pub fn import_gltf(path: &Path) -> BakeResult<Vec<ImportedMesh>> {
    let (document, buffers, _images) = gltf::import(path)?;

    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        let name = mesh
            .name()
            .map_or_else(|| format!("mesh_{}", mesh.index()), str::to_string);

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::debug!(
                    "Skipping {:?} primitive of {} in {}",
                    primitive.mode(),
                    name,
                    path.display()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = reader.read_normals().map(Iterator::collect).unwrap_or_default();
            let colors: Vec<[f32; 3]> = reader
                .read_colors(0)
                .map(|colors| colors.into_rgb_f32().collect())
                .unwrap_or_default();
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|uvs| uvs.into_f32().collect())
                .unwrap_or_default();
            let indices: Vec<u32> = reader.read_indices().map_or_else(
                || (0..positions.len() as u32).collect(),
                |indices| indices.into_u32().collect(),
            );

            let vertices = positions
                .iter()
                .enumerate()
                .map(|(i, &position)| {
                    VertexPncvF32::new(
                        position,
                        normals.get(i).copied().unwrap_or([0.0; 3]),
                        colors.get(i).copied().unwrap_or([1.0; 3]),
                        uvs.get(i).copied().unwrap_or([0.0; 2]),
                    )
                })
                .collect();

            meshes.push(ImportedMesh {
                name: name.clone(),
                vertices,
                indices,
            });
        }
    }

    Ok(meshes)
}

fn convert_vertices(mesh: &tobj::Mesh) -> Vec<VertexPncvF32> {
    (0..mesh.positions.len() / 3)
        .map(|i| {
            let position = [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ];
            let normal = mesh
                .normals
                .get(i * 3..i * 3 + 3)
                .map_or([0.0; 3], |n| [n[0], n[1], n[2]]);
            let color = mesh
                .vertex_color
                .get(i * 3..i * 3 + 3)
                .map_or([1.0; 3], |c| [c[0], c[1], c[2]]);
            let uv = mesh
                .texcoords
                .get(i * 2..i * 2 + 2)
                .map_or([0.0; 2], |t| [t[0], 1.0 - t[1]]);

            VertexPncvF32::new(position, normal, color, uv)
        })
        .collect()
}
