//! Asynchronous asset loading
//!
//! Each request runs on its own worker thread. Workers decode files into
//! plain data and report back as [`LoadEvent`]s over a channel that the
//! main thread drains without blocking.

pub mod cube_texture;
pub mod gltf_loader;
pub mod obj_loader;

use std::{
    io::Read,
    path::{Path, PathBuf},
    thread,
};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use thiserror::Error;

use crate::gfx::scene::node::SceneNode;

pub use cube_texture::{CubeFace, CubeTexture};

/// Bytes read per progress step
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode image '{path}': {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("invalid glTF '{path}': {source}")]
    Gltf {
        path: PathBuf,
        source: gltf::Error,
    },
    #[error("invalid OBJ '{path}': {source}")]
    Obj {
        path: PathBuf,
        source: tobj::LoadError,
    },
    #[error("cubemap face '{path}' is {width}x{height}, expected {expected}x{expected}")]
    FaceSize {
        path: PathBuf,
        expected: u32,
        width: u32,
        height: u32,
    },
    #[error("unsupported model format: '{0}'")]
    UnsupportedFormat(PathBuf),
    #[error("'{0}' contains no drawable geometry")]
    Empty(PathBuf),
}

/// Results reported by loader workers
pub enum LoadEvent {
    CubeTextureLoaded(CubeTexture),
    CubeTextureFailed(LoadError),
    /// Cumulative bytes of the model document read so far
    ModelProgress { loaded: u64, total: u64 },
    ModelLoaded(SceneNode),
    ModelFailed(LoadError),
}

/// Model file formats the loader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Gltf,
    Obj,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "gltf" | "glb" => Some(ModelFormat::Gltf),
            "obj" => Some(ModelFormat::Obj),
            _ => None,
        }
    }
}

/// Issues load requests and collects their results
pub struct AssetLoader {
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Starts decoding six cubemap faces in +X, -X, +Y, -Y, +Z, -Z order
    pub fn load_cube_texture(&self, paths: [PathBuf; 6]) {
        let sender = self.sender.clone();
        let first = paths[0].clone();
        self.spawn("cubemap-loader", first, LoadEvent::CubeTextureFailed, move || {
            let event = match CubeTexture::load_faces(&paths) {
                Ok(texture) => LoadEvent::CubeTextureLoaded(texture),
                Err(e) => LoadEvent::CubeTextureFailed(e),
            };
            let _ = sender.send(event);
        });
    }

    /// Starts loading a model, reporting progress while the file is read
    pub fn load_model(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let sender = self.sender.clone();
        self.spawn("model-loader", path.clone(), LoadEvent::ModelFailed, move || {
            let result = load_model_file(&path, |loaded, total| {
                let _ = sender.send(LoadEvent::ModelProgress { loaded, total });
            });
            let event = match result {
                Ok(node) => LoadEvent::ModelLoaded(node),
                Err(e) => LoadEvent::ModelFailed(e),
            };
            let _ = sender.send(event);
        });
    }

    /// Next finished event, if any
    pub fn try_recv(&self) -> Option<LoadEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn spawn(
        &self,
        name: &str,
        path: PathBuf,
        on_failure: fn(LoadError) -> LoadEvent,
        work: impl FnOnce() + Send + 'static,
    ) {
        if let Err(source) = thread::Builder::new().name(name.to_string()).spawn(work) {
            log::error!("Could not start {} thread: {}", name, source);
            let _ = self.sender.send(on_failure(LoadError::Io { path, source }));
        }
    }
}

/// Reads a whole file in chunks, calling `progress(loaded, total)` after each
pub fn read_with_progress(
    path: &Path,
    mut progress: impl FnMut(u64, u64),
) -> Result<Vec<u8>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::open(path).map_err(io_error)?;
    let total = file.metadata().map_err(io_error)?.len();
    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut chunk).map_err(io_error)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        progress(bytes.len() as u64, total);
    }

    Ok(bytes)
}

/// Reads and converts a model file into a scene fragment
pub fn load_model_file(
    path: &Path,
    progress: impl FnMut(u64, u64),
) -> Result<SceneNode, LoadError> {
    let format = ModelFormat::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
    let bytes = read_with_progress(path, progress)?;

    match format {
        ModelFormat::Gltf => gltf_loader::load_gltf(path, &bytes),
        ModelFormat::Obj => obj_loader::load_obj(path, &bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn next_event(loader: &AssetLoader) -> LoadEvent {
        for _ in 0..500 {
            if let Some(event) = loader.try_recv() {
                return event;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("loader produced no event");
    }

    #[test]
    fn test_model_format_from_extension() {
        assert_eq!(ModelFormat::from_path(Path::new("a/FlightHelmet.gltf")), Some(ModelFormat::Gltf));
        assert_eq!(ModelFormat::from_path(Path::new("b.GLB")), Some(ModelFormat::Gltf));
        assert_eq!(ModelFormat::from_path(Path::new("c.obj")), Some(ModelFormat::Obj));
        assert_eq!(ModelFormat::from_path(Path::new("d.fbx")), None);
    }

    #[test]
    fn test_read_reports_cumulative_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        std::fs::write(&path, vec![7u8; CHUNK_SIZE * 2 + 10]).unwrap();

        let mut steps = Vec::new();
        let bytes = read_with_progress(&path, |loaded, total| steps.push((loaded, total))).unwrap();

        let total = (CHUNK_SIZE * 2 + 10) as u64;
        assert_eq!(bytes.len() as u64, total);
        assert_eq!(steps.last(), Some(&(total, total)));
        assert!(steps.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_missing_model_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_model_file(&dir.path().join("missing.gltf"), |_, _| {});
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_unsupported_format_is_rejected_before_reading() {
        let result = load_model_file(Path::new("model.fbx"), |_, _| {});
        assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_worker_reports_progress_then_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let loader = AssetLoader::new();
        loader.load_model(&path);

        assert!(matches!(
            next_event(&loader),
            LoadEvent::ModelProgress { loaded, total } if loaded == total
        ));
        assert!(matches!(next_event(&loader), LoadEvent::ModelLoaded(_)));
    }

    #[test]
    fn test_worker_reports_cubemap_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new();
        loader.load_cube_texture(cube_texture::face_paths(dir.path(), "jpg"));

        assert!(matches!(
            next_event(&loader),
            LoadEvent::CubeTextureFailed(LoadError::Io { .. })
        ));
    }
}
