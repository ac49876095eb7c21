use std::path::Path;
use std::path::PathBuf;
use tracing::debug;

use crate::windy_error::MyResult;

pub const VERTEX_SHADER_NAME: &str = "SampleVertexShader.cso";
pub const PIXEL_SHADER_NAME: &str = "SamplePixelShader.cso";

/// Where compiled shader binaries come from.
///
/// Called from background tasks, hence `Send + Sync`.
pub trait ShaderSource: Send + Sync + 'static {
    fn read_data(&self, name: &str) -> MyResult<Vec<u8>>;
}

/// Reads shader binaries from a directory on disk.
#[derive(Clone, Debug)]
pub struct AssetDirectory {
    root: PathBuf,
}

impl AssetDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory containing the running executable, where the build
    /// copies the `.cso` files.
    pub fn next_to_executable() -> MyResult<Self> {
        let exe_path = std::env::current_exe()?;
        let dir = exe_path
            .parent()
            .ok_or_else(|| eyre::eyre!("executable path {exe_path:?} has no parent"))?;
        Ok(Self::new(dir))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ShaderSource for AssetDirectory {
    fn read_data(&self, name: &str) -> MyResult<Vec<u8>> {
        let path = self.root.join(name);
        debug!(?path, "Reading shader binary");
        std::fs::read(&path).map_err(|e| {
            eyre::Report::new(e)
                .wrap_err(format!("failed to read shader binary {}", path.display()))
                .into()
        })
    }
}
