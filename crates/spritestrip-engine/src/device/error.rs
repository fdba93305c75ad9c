/// What the frame loop should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next frame may render.
    Reconfigured,
    /// Transient; drop this frame.
    SkipFrame,
    /// Out of memory. Shut down.
    Fatal,
}

impl SurfaceErrorAction {
    /// Classifies `err`. Lost/outdated surfaces need a `configure` call, which
    /// the caller performs when this returns `Reconfigured`.
    pub fn classify(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                SurfaceErrorAction::Reconfigured
            }
            wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }

    #[inline]
    pub fn is_fatal(self) -> bool {
        self == SurfaceErrorAction::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_surface_is_recoverable() {
        let action = SurfaceErrorAction::classify(&wgpu::SurfaceError::Lost);
        assert_eq!(action, SurfaceErrorAction::Reconfigured);
        assert!(!action.is_fatal());
    }

    #[test]
    fn out_of_memory_is_fatal() {
        assert!(SurfaceErrorAction::classify(&wgpu::SurfaceError::OutOfMemory).is_fatal());
        assert_eq!(
            SurfaceErrorAction::classify(&wgpu::SurfaceError::Timeout),
            SurfaceErrorAction::SkipFrame
        );
    }
}
