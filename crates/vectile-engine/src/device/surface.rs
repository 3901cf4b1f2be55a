use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

/// First supported format whose sRGB-ness matches `srgb`, else the
/// surface's preferred format.
pub(crate) fn pick_format(caps: &wgpu::SurfaceCapabilities, srgb: bool) -> Option<wgpu::TextureFormat> {
    caps.formats
        .iter()
        .copied()
        .find(|format| format.is_srgb() == srgb)
        .or_else(|| caps.formats.first().copied())
}

pub(crate) fn pick_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    let supported = |mode: &wgpu::CompositeAlphaMode| caps.alpha_modes.contains(mode);
    match requested.filter(supported) {
        Some(mode) => mode,
        None => caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
    }
}

pub(crate) fn is_drawable(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

/// Classifies an acquire failure. Lost and outdated surfaces need a
/// reconfigure before the next acquire.
pub(crate) fn classify(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_surfaces_are_not_drawable() {
        assert!(is_drawable(PhysicalSize::new(1, 1)));
        assert!(!is_drawable(PhysicalSize::new(0, 600)));
        assert!(!is_drawable(PhysicalSize::new(800, 0)));
    }

    #[test]
    fn lost_surfaces_are_reconfigured() {
        assert_eq!(classify(&wgpu::SurfaceError::Lost), SurfaceErrorAction::Reconfigured);
        assert_eq!(classify(&wgpu::SurfaceError::Outdated), SurfaceErrorAction::Reconfigured);
        assert_eq!(classify(&wgpu::SurfaceError::Timeout), SurfaceErrorAction::SkipFrame);
        assert_eq!(classify(&wgpu::SurfaceError::OutOfMemory), SurfaceErrorAction::Fatal);
    }
}
