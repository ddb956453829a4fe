//! # Bake Pipeline
//!
//! ```text
//! discover_sources ──► [rayon pool] prepare ──► claim outputs ──► [rayon pool] write
//!                        ├─ texture: <stem>.tx                (discovery order)
//!                        └─ mesh:    <stem>.mesh | <stem>_<n>.mesh
//! ```
//!
//! Sources are independent, so the only parallelism is across files. Each
//! job owns its buffers. Output paths are claimed in discovery order before
//! anything is written, so two sources never race for the same file; the
//! later one is reported as [`BakeError::OutputCollision`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use kiln_assets::{build_mesh, pack_texture, save_binary_file, AssetFile, AssetKind, TextureInfo};
use rayon::prelude::*;

use crate::config::BakerConfig;
use crate::error::{BakeError, BakeResult};
use crate::import::{decode_image, import_gltf, import_obj, ImportedMesh};

/// Extensions baked as textures.
pub const TEXTURE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tga", "bmp"];

/// Extensions baked as meshes.
pub const MESH_EXTENSIONS: &[&str] = &["obj", "glb", "gltf"];

/// A source file the baker knows how to handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceAsset {
    /// Path of the source file.
    pub path: PathBuf,
    /// What it bakes into.
    pub kind: AssetKind,
}

impl SourceAsset {
    /// Classifies a path by its extension, case-insensitively.
    #[must_use]
    pub fn classify(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let kind = if TEXTURE_EXTENSIONS.contains(&ext.as_str()) {
            AssetKind::Texture
        } else if MESH_EXTENSIONS.contains(&ext.as_str()) {
            AssetKind::Mesh
        } else {
            return None;
        };

        Some(Self {
            path: path.to_path_buf(),
            kind,
        })
    }

    /// File stem used to name the outputs.
    #[must_use]
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map_or_else(|| "unnamed".to_string(), |s| s.to_string_lossy().into_owned())
    }

    fn extension(&self) -> String {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// Lists the bakeable files directly inside `dir`, sorted by path.
///
/// Subdirectories are not entered, so the default output directory is never
/// rescanned.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be listed.
pub fn discover_sources(dir: &Path) -> BakeResult<Vec<SourceAsset>> {
    let mut sources = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match SourceAsset::classify(&path) {
            Some(source) => sources.push(source),
            None => tracing::debug!("Skipping {}", path.display()),
        }
    }

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sources)
}

/// A packed container and the path it will be written to.
#[derive(Clone, Debug)]
pub struct PreparedOutput {
    /// Destination file.
    pub path: PathBuf,
    /// Packed container.
    pub file: AssetFile,
}

/// Decodes an image and packs it as `<stem>.tx`, without writing it.
///
/// # Errors
///
/// Returns a decode or pack error.
pub fn prepare_texture(
    source: &SourceAsset,
    output_dir: &Path,
    config: &BakerConfig,
) -> BakeResult<Vec<PreparedOutput>> {
    let image = decode_image(&source.path)?;
    let info = TextureInfo::rgba8(
        image.width,
        image.height,
        source.path.to_string_lossy(),
        config.texture_compression,
    );
    let file = pack_texture(&info, &image.pixels)?;
    let path = output_dir.join(format!("{}.{}", source.stem(), AssetKind::Texture.extension()));

    tracing::debug!(
        "Packed texture {} ({}x{}, {} -> {} bytes)",
        source.path.display(),
        info.width,
        info.height,
        info.texture_size,
        file.payload().len()
    );
    Ok(vec![PreparedOutput { path, file }])
}

/// Imports a mesh source and packs one container per non-empty sub-mesh,
/// without writing them.
///
/// OBJ files are read with `tobj`; `.gltf` and `.glb` with `gltf`. A single
/// sub-mesh is named `<stem>.mesh`, several are named `<stem>_0.mesh`,
/// `<stem>_1.mesh`, ... in file order.
///
/// # Errors
///
/// Returns [`BakeError::EmptyMesh`] if no sub-mesh has triangles, or an
/// import or pack error.
pub fn prepare_mesh(
    source: &SourceAsset,
    output_dir: &Path,
    config: &BakerConfig,
) -> BakeResult<Vec<PreparedOutput>> {
    let imported = match source.extension().as_str() {
        "gltf" | "glb" => import_gltf(&source.path)?,
        _ => import_obj(&source.path)?,
    };
    let mut meshes: Vec<ImportedMesh> = imported
        .into_iter()
        .filter(|mesh| !mesh.indices.is_empty())
        .collect();
    if meshes.is_empty() {
        return Err(BakeError::EmptyMesh(source.path.clone()));
    }

    let stem = source.stem();
    let numbered = meshes.len() > 1;
    let mut outputs = Vec::with_capacity(meshes.len());

    for (n, mesh) in meshes.iter_mut().enumerate() {
        let file = build_mesh(
            &mut mesh.vertices,
            &mesh.indices,
            source.path.to_string_lossy(),
            config.normal_mode,
        )?;

        let name = if numbered {
            format!("{stem}_{n}.{}", AssetKind::Mesh.extension())
        } else {
            format!("{stem}.{}", AssetKind::Mesh.extension())
        };

        tracing::debug!(
            "Packed mesh {} [{}] ({} vertices, {} triangles)",
            source.path.display(),
            mesh.name,
            mesh.vertices.len(),
            mesh.indices.len() / 3
        );
        outputs.push(PreparedOutput {
            path: output_dir.join(name),
            file,
        });
    }

    Ok(outputs)
}

/// Writes prepared containers and returns their paths.
///
/// # Errors
///
/// Returns the first write error.
pub fn write_outputs(source: &SourceAsset, outputs: Vec<PreparedOutput>) -> BakeResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(outputs.len());
    for output in outputs {
        save_binary_file(&output.path, &output.file)?;
        tracing::info!(
            "Baked {} -> {} ({} bytes)",
            source.path.display(),
            output.path.display(),
            output.file.payload().len()
        );
        written.push(output.path);
    }
    Ok(written)
}

/// Decodes an image and writes `<stem>.tx` into `output_dir`.
///
/// # Errors
///
/// Returns a decode, pack or write error.
pub fn bake_texture(source: &SourceAsset, output_dir: &Path, config: &BakerConfig) -> BakeResult<Vec<PathBuf>> {
    write_outputs(source, prepare_texture(source, output_dir, config)?)
}

/// Imports a mesh source and writes one mesh container per non-empty
/// sub-mesh. See [`prepare_mesh`] for naming.
///
/// # Errors
///
/// Returns [`BakeError::EmptyMesh`] if no sub-mesh has triangles, or an
/// import, pack or write error.
pub fn bake_mesh(source: &SourceAsset, output_dir: &Path, config: &BakerConfig) -> BakeResult<Vec<PathBuf>> {
    write_outputs(source, prepare_mesh(source, output_dir, config)?)
}

/// Output paths already taken, mapped to the source that took them.
#[derive(Debug, Default)]
struct OutputClaims {
    owners: HashMap<PathBuf, PathBuf>,
}

impl OutputClaims {
    /// Claims every output of `source`, or none of them.
    fn claim(&mut self, source: &Path, outputs: Vec<PreparedOutput>) -> BakeResult<Vec<PreparedOutput>> {
        if let Some((output, first)) = outputs
            .iter()
            .find_map(|o| self.owners.get(&o.path).map(|first| (o.path.clone(), first.clone())))
        {
            return Err(BakeError::OutputCollision { output, first });
        }

        for output in &outputs {
            self.owners.insert(output.path.clone(), source.to_path_buf());
        }
        Ok(outputs)
    }
}

/// A source that baked successfully.
#[derive(Clone, Debug)]
pub struct BakedAsset {
    /// The source file.
    pub source: PathBuf,
    /// Files written for it.
    pub outputs: Vec<PathBuf>,
}

/// A source that failed to bake.
#[derive(Debug)]
pub struct FailedAsset {
    /// The source file.
    pub source: PathBuf,
    /// Why it failed.
    pub error: BakeError,
}

/// Outcome of a baking run.
#[derive(Debug, Default)]
pub struct BakeReport {
    /// Successful sources, in discovery order.
    pub baked: Vec<BakedAsset>,
    /// Failed sources, in discovery order.
    pub failed: Vec<FailedAsset>,
}

impl BakeReport {
    /// True if every source baked.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of files written.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.baked.iter().map(|b| b.outputs.len()).sum()
    }
}

/// Bakes every source in one directory.
#[derive(Clone, Debug)]
pub struct Baker {
    input_dir: PathBuf,
    output_dir: PathBuf,
    config: BakerConfig,
}

impl Baker {
    /// Creates a baker for `input_dir`.
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>, config: BakerConfig) -> Self {
        let input_dir = input_dir.into();
        let output_dir = config.output_dir_for(&input_dir);
        Self {
            input_dir,
            output_dir,
            config,
        }
    }

    /// Directory baked files are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The configuration this baker runs with.
    #[must_use]
    pub const fn config(&self) -> &BakerConfig {
        &self.config
    }

    /// Decodes and packs one source without writing anything.
    ///
    /// # Errors
    ///
    /// See [`prepare_texture`] and [`prepare_mesh`].
    pub fn prepare(&self, source: &SourceAsset) -> BakeResult<Vec<PreparedOutput>> {
        match source.kind {
            AssetKind::Texture => prepare_texture(source, &self.output_dir, &self.config),
            AssetKind::Mesh => prepare_mesh(source, &self.output_dir, &self.config),
        }
    }

    /// Bakes one source into the output directory.
    ///
    /// # Errors
    ///
    /// See [`bake_texture`] and [`bake_mesh`].
    pub fn bake(&self, source: &SourceAsset) -> BakeResult<Vec<PathBuf>> {
        write_outputs(source, self.prepare(source)?)
    }

    /// Bakes every discovered source on a fixed-size worker pool.
    ///
    /// Per-asset failures are logged and collected in the report; they
    /// never stop the batch. When two sources map to the same output file,
    /// the first in discovery order is baked and the other fails with
    /// [`BakeError::OutputCollision`].
    ///
    /// # Errors
    ///
    /// Only batch setup fails the run: listing the input, creating the
    /// output directory or starting the pool.
    pub fn run(&self) -> BakeResult<BakeReport> {
        let sources = discover_sources(&self.input_dir)?;
        std::fs::create_dir_all(&self.output_dir)?;

        let workers = self.config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("kiln-bake-{i}"))
            .build()?;

        tracing::info!(
            "Baking {} sources from {} into {} with {} workers",
            sources.len(),
            self.input_dir.display(),
            self.output_dir.display(),
            workers
        );

        let prepared: Vec<_> = pool.install(|| sources.par_iter().map(|source| self.prepare(source)).collect());

        let mut claims = OutputClaims::default();
        let jobs: Vec<_> = sources
            .iter()
            .zip(prepared)
            .map(|(source, result)| {
                let result = result.and_then(|outputs| claims.claim(&source.path, outputs));
                (source, result)
            })
            .collect();

        let results: Vec<_> = pool.install(|| {
            jobs.into_par_iter()
                .map(|(source, result)| result.and_then(|outputs| write_outputs(source, outputs)))
                .collect()
        });

        let mut report = BakeReport::default();
        for (source, result) in sources.into_iter().zip(results) {
            match result {
                Ok(outputs) => report.baked.push(BakedAsset {
                    source: source.path,
                    outputs,
                }),
                Err(error) => {
                    tracing::warn!("Failed to bake {}: {}", source.path.display(), error);
                    report.failed.push(FailedAsset {
                        source: source.path,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            "Baked {} sources ({} files), {} failed",
            report.baked.len(),
            report.output_count(),
            report.failed.len()
        );
        Ok(report)
    }
}
