use std::path::Path;
use std::path::PathBuf;
use tracing::warn;

/// Options read from the process arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub use_warp_device: bool,
    pub window_size: (u32, u32),
    pub vsync: bool,
    pub debug_layer: bool,
    /// Directory holding the compiled shaders, next to the executable when unset.
    pub shader_directory: Option<PathBuf>,
    /// HLSL sources compiled when a `.cso` is missing, `shaders/` next to the executable when unset.
    pub hlsl_directory: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_warp_device: false,
            window_size: (1280, 720),
            vsync: true,
            debug_layer: cfg!(debug_assertions),
            shader_directory: None,
            hlsl_directory: None,
            verbose: false,
        }
    }
}

impl EngineConfig {
    pub fn title(&self) -> String {
        match self.use_warp_device {
            true => "Direct3D 11 Engine (WARP)".to_owned(),
            false => "Direct3D 11 Engine".to_owned(),
        }
    }

    /// Where the HLSL sources are looked up, relative to the executable unless overridden.
    pub fn hlsl_source_directory(&self, executable_directory: &Path) -> PathBuf {
        match &self.hlsl_directory {
            Some(dir) => dir.clone(),
            None => executable_directory.join("shaders"),
        }
    }
}

/// Builds an [`EngineConfig`] from the process arguments
pub fn build_command_line() -> EngineConfig {
    parse_command_line(std::env::args().skip(1))
}

/// Flags accept `-` or `/` and any casing. Unknown flags are logged and skipped.
pub fn parse_command_line(args: impl IntoIterator<Item = impl AsRef<str>>) -> EngineConfig {
    let mut config = EngineConfig::default();

    for arg in args {
        let arg = arg.as_ref();
        let Some(flag) = arg.strip_prefix('-').or_else(|| arg.strip_prefix('/')) else {
            warn!(arg, "Ignoring positional argument");
            continue;
        };
        let (name, value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (flag, None),
        };

        match (name.to_ascii_lowercase().as_str(), value) {
            ("warp", None) => config.use_warp_device = true,
            ("novsync", None) => config.vsync = false,
            ("debug", None) => config.debug_layer = true,
            ("verbose", None) => config.verbose = true,
            ("shaders", Some(dir)) if !dir.is_empty() => {
                config.shader_directory = Some(PathBuf::from(dir));
            }
            ("hlsl", Some(dir)) if !dir.is_empty() => {
                config.hlsl_directory = Some(PathBuf::from(dir));
            }
            ("width", Some(value)) => match parse_dimension(value) {
                Some(width) => config.window_size.0 = width,
                None => warn!(value, "Ignoring invalid window width"),
            },
            ("height", Some(value)) => match parse_dimension(value) {
                Some(height) => config.window_size.1 = height,
                None => warn!(value, "Ignoring invalid window height"),
            },
            _ => warn!(arg, "Ignoring unknown argument"),
        }
    }

    config
}

fn parse_dimension(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|&v| v > 0)
}
