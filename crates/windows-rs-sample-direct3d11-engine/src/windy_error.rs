pub type MyResult<T, E = MyReport> = core::result::Result<T, E>;

/// Error type shared by the renderers, the device backends and the runner.
///
/// Thin wrapper around [`eyre::Report`] so that foreign error types
/// (HRESULTs, task join failures) can be converted with `?`.
pub struct MyReport {
    inner: eyre::Report,
}

impl MyReport {
    pub fn msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self {
            inner: eyre::Report::msg(message),
        }
    }

    pub fn wrap_err(self, context: impl std::fmt::Display + Send + Sync + 'static) -> Self {
        Self {
            inner: self.inner.wrap_err(context),
        }
    }
}

impl From<eyre::Report> for MyReport {
    fn from(report: eyre::Report) -> Self {
        Self { inner: report }
    }
}

impl From<tokio::task::JoinError> for MyReport {
    fn from(error: tokio::task::JoinError) -> Self {
        Self {
            inner: eyre::Report::new(error).wrap_err("background load task did not finish"),
        }
    }
}

impl From<std::io::Error> for MyReport {
    fn from(error: std::io::Error) -> Self {
        Self {
            inner: eyre::Report::new(error),
        }
    }
}

impl std::fmt::Display for MyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl std::fmt::Debug for MyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for MyReport {
    fn from(error: windows::core::Error) -> Self {
        Self {
            inner: eyre::Report::new(WrappedWindowsError::from(error)),
        }
    }
}

/// Keeps the HRESULT around so callers can still match on it
/// (e.g. `D2DERR_RECREATE_TARGET`, `DXGI_ERROR_DEVICE_REMOVED`).
#[cfg(windows)]
pub struct WrappedWindowsError {
    inner: windows::core::Error,
}

#[cfg(windows)]
impl WrappedWindowsError {
    pub fn code(&self) -> windows::core::HRESULT {
        self.inner.code()
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for WrappedWindowsError {
    fn from(error: windows::core::Error) -> Self {
        Self { inner: error }
    }
}

#[cfg(windows)]
impl std::error::Error for WrappedWindowsError {}

#[cfg(windows)]
impl std::fmt::Display for WrappedWindowsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[cfg(windows)]
impl std::fmt::Debug for WrappedWindowsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}
