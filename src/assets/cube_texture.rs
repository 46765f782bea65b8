//! Six-face environment cubemaps decoded on the CPU

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::gfx::resources::texture_resource::ColorSpace;

use super::LoadError;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Face order for cube maps: +X, -X, +Y, -Y, +Z, -Z
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Conventional file stem of the face image (`px`, `nx`, ...)
    pub fn file_stem(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "px",
            CubeFace::NegativeX => "nx",
            CubeFace::PositiveY => "py",
            CubeFace::NegativeY => "ny",
            CubeFace::PositiveZ => "pz",
            CubeFace::NegativeZ => "nz",
        }
    }
}

/// The six face paths of a cubemap stored as `px.png`, `nx.png`, ...
pub fn face_paths(directory: &Path, extension: &str) -> [PathBuf; 6] {
    CubeFace::ALL.map(|face| directory.join(format!("{}.{}", face.file_stem(), extension)))
}

/// A cubemap with square RGBA8 faces, each carrying a full mip chain.
///
/// Every texture gets a distinct generation number; the renderer re-uploads
/// whenever the generation it last saw changes.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeTexture {
    size: u32,
    /// faces[face][mip] holds tightly packed RGBA8 texels
    faces: [Vec<Vec<u8>>; 6],
    color_space: ColorSpace,
    generation: u64,
}

impl CubeTexture {
    /// Builds a cubemap from six `size` x `size` RGBA8 faces
    pub fn from_faces(size: u32, faces: [Vec<u8>; 6], color_space: ColorSpace) -> Self {
        debug_assert!(faces
            .iter()
            .all(|face| face.len() == (size * size * 4) as usize));
        Self {
            size,
            faces: faces.map(|face| build_mip_chain(size, face)),
            color_space,
            generation: next_generation(),
        }
    }

    /// A 1x1 cubemap of a single color
    pub fn solid(rgba: [u8; 4], color_space: ColorSpace) -> Self {
        Self::from_faces(1, std::array::from_fn(|_| rgba.to_vec()), color_space)
    }

    /// Decodes six face images given in +X, -X, +Y, -Y, +Z, -Z order.
    ///
    /// Faces must be square and all the same size. The result is tagged
    /// [`ColorSpace::Linear`]; callers retag it when the images are sRGB.
    pub fn load_faces(paths: &[PathBuf; 6]) -> Result<Self, LoadError> {
        let mut faces: [Vec<u8>; 6] = Default::default();
        let mut size = 0;

        for (i, path) in paths.iter().enumerate() {
            let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let image = image::load_from_memory(&bytes)
                .map_err(|source| LoadError::Image {
                    path: path.clone(),
                    source,
                })?
                .to_rgba8();

            let (width, height) = image.dimensions();
            let expected = if i == 0 { width } else { size };
            if width != height || width != expected || width == 0 {
                return Err(LoadError::FaceSize {
                    path: path.clone(),
                    expected,
                    width,
                    height,
                });
            }
            size = width;
            faces[i] = image.into_raw();
        }

        log::debug!("Decoded cubemap faces at {}x{}", size, size);
        Ok(Self::from_faces(size, faces, ColorSpace::Linear))
    }

    /// Retags the texel color space. Counts as a new texture.
    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        if self.color_space != color_space {
            self.color_space = color_space;
            self.generation = next_generation();
        }
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn faces(&self) -> &[Vec<Vec<u8>>; 6] {
        &self.faces
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mip_level_count(&self) -> u32 {
        self.faces[0].len() as u32
    }
}

/// Box-filtered mip chain down to 1x1, level 0 first
fn build_mip_chain(size: u32, base: Vec<u8>) -> Vec<Vec<u8>> {
    let mut levels = vec![base];
    let mut extent = size;

    while extent > 1 {
        let next = (extent / 2).max(1);
        let Some(previous) = levels.last() else {
            break;
        };
        let mut level = vec![0u8; (next * next * 4) as usize];

        for y in 0..next {
            for x in 0..next {
                for channel in 0..4 {
                    let mut sum = 0u32;
                    for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                        let sx = (x * 2 + dx).min(extent - 1);
                        let sy = (y * 2 + dy).min(extent - 1);
                        sum += previous[((sy * extent + sx) * 4 + channel) as usize] as u32;
                    }
                    level[((y * next + x) * 4 + channel) as usize] = ((sum + 2) / 4) as u8;
                }
            }
        }

        levels.push(level);
        extent = next;
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_face(path: &Path, size: u32, color: [u8; 4]) {
        image::RgbaImage::from_pixel(size, size, image::Rgba(color))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_load_faces_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let paths = face_paths(dir.path(), "png");
        for (i, path) in paths.iter().enumerate() {
            write_face(path, 4, [i as u8 * 40, 0, 0, 255]);
        }

        let cube = CubeTexture::load_faces(&paths).unwrap();
        assert_eq!(cube.size(), 4);
        assert_eq!(cube.mip_level_count(), 3);
        assert_eq!(cube.color_space(), ColorSpace::Linear);
        assert_eq!(cube.faces()[5][0][0], 200);
        assert_eq!(cube.faces()[5][2], vec![200, 0, 0, 255]);
    }

    #[test]
    fn test_mismatched_face_sizes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = face_paths(dir.path(), "png");
        for (i, path) in paths.iter().enumerate() {
            write_face(path, if i == 3 { 8 } else { 4 }, [255; 4]);
        }

        match CubeTexture::load_faces(&paths) {
            Err(LoadError::FaceSize {
                expected, width, ..
            }) => {
                assert_eq!(expected, 4);
                assert_eq!(width, 8);
            }
            other => panic!("expected FaceSize error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_face_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = face_paths(dir.path(), "png");
        assert!(matches!(
            CubeTexture::load_faces(&paths),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn test_retagging_bumps_generation() {
        let cube = CubeTexture::solid([0, 0, 0, 255], ColorSpace::Linear);
        let before = cube.generation();
        let cube = cube.with_color_space(ColorSpace::Srgb);
        assert_ne!(cube.generation(), before);
        assert_eq!(cube.color_space(), ColorSpace::Srgb);
    }

    #[test]
    fn test_mip_chain_averages() {
        let base = [[0u8, 0, 0, 0], [255, 255, 255, 255], [0, 0, 0, 0], [255, 255, 255, 255]]
            .concat();
        let levels = build_mip_chain(2, base);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1], vec![128, 128, 128, 128]);
    }
}
