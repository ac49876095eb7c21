use std::path::PathBuf;
use tracing::error;
use tracing::info;
use windows::core::*;
use windows::Win32::Graphics::Direct3D::Fxc::*;
use windows::Win32::Graphics::Direct3D::*;

use crate::shader_source::AssetDirectory;
use crate::shader_source::ShaderSource;
use crate::shader_source::PIXEL_SHADER_NAME;
use crate::shader_source::VERTEX_SHADER_NAME;
use crate::windy_error::MyResult;

/// Compiles an HLSL file with FXC and returns the bytecode.
pub fn compile_shader(hlsl_path: &HSTRING, entry_point: PCSTR, target: PCSTR) -> MyResult<Vec<u8>> {
    let flags = if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        0
    };

    let mut shader_blob = None;
    let mut error_blob = None;
    let result = unsafe {
        D3DCompileFromFile(
            hlsl_path,
            None,
            None,
            entry_point,
            target,
            flags,
            0,
            &mut shader_blob,
            Some(&mut error_blob),
        )
    };

    if let Err(e) = result {
        if let Some(error) = error_blob {
            let error_msg = String::from_utf8_lossy(blob_bytes(&error)).into_owned();
            let target = unsafe { String::from_utf8_lossy(target.as_bytes()) };
            error!("Shader compile error ({hlsl_path} {target}): {error_msg}");
            return Err(eyre::Report::new(crate::windy_error::WrappedWindowsError::from(e))
                .wrap_err(error_msg)
                .into());
        }
        return Err(e.into());
    }

    let shader_blob =
        shader_blob.ok_or_else(|| eyre::eyre!("D3DCompileFromFile returned no bytecode"))?;
    Ok(blob_bytes(&shader_blob).to_vec())
}

fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    unsafe { std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize()) }
}

/// Reads `.cso` files, compiling the matching `.hlsl` source when the
/// binary has not been built.
pub struct HlslShaderSource {
    binaries: AssetDirectory,
    sources: PathBuf,
}

impl HlslShaderSource {
    pub fn new(binaries: AssetDirectory, sources: impl Into<PathBuf>) -> Self {
        Self {
            binaries,
            sources: sources.into(),
        }
    }
}

impl ShaderSource for HlslShaderSource {
    fn read_data(&self, name: &str) -> MyResult<Vec<u8>> {
        if self.binaries.root().join(name).is_file() {
            return self.binaries.read_data(name);
        }

        let target = match name {
            VERTEX_SHADER_NAME => s!("vs_5_0"),
            PIXEL_SHADER_NAME => s!("ps_5_0"),
            _ => return self.binaries.read_data(name),
        };
        let hlsl_path = self.sources.join(name).with_extension("hlsl");
        info!(?hlsl_path, "No precompiled {name}, compiling from source");
        compile_shader(&HSTRING::from(hlsl_path.as_path()), s!("main"), target)
    }
}
