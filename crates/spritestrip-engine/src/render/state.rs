use crate::device::{DeviceContext, ProgramHandle};

use super::program::{ProgramKind, ProgramRegistry, ShaderProgram};
use super::texture::TextureCache;

/// Tracks the one active program.
///
/// Every mode change goes through [`activate`](Self::activate), which disables
/// the outgoing program's attributes before enabling the incoming ones, so at
/// most one program's attributes are ever enabled.
#[derive(Debug, Default)]
pub struct RenderStateMachine {
    active: Option<ProgramKind>,
    switches: u64,
}

impl RenderStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn active(&self) -> Option<ProgramKind> {
        self.active
    }

    /// Number of program changes since construction.
    #[inline]
    pub fn switches(&self) -> u64 {
        self.switches
    }

    /// Makes `kind` the active program and returns its handle.
    ///
    /// No device calls when `kind` is already active. Entering an image mode
    /// drops the cached texture so the next draw rebinds it.
    pub fn activate<D: DeviceContext>(
        &mut self,
        device: &mut D,
        programs: &ProgramRegistry,
        textures: &mut TextureCache,
        kind: ProgramKind,
    ) -> ProgramHandle {
        let target = programs.get(kind);
        if self.active == Some(kind) {
            return target.handle;
        }

        if let Some(previous) = self.active.take() {
            set_attributes(device, programs.get(previous), false);
        }

        device.use_program(Some(target.handle));
        set_attributes(device, target, true);

        if kind.is_textured() {
            textures.invalidate(device);
        }

        log::debug!("program switch -> {kind:?}");
        self.active = Some(kind);
        self.switches += 1;
        target.handle
    }

    /// Disables the active program, if any, and unbinds it.
    pub fn deactivate_all<D: DeviceContext>(&mut self, device: &mut D, programs: &ProgramRegistry) {
        if let Some(previous) = self.active.take() {
            set_attributes(device, programs.get(previous), false);
            device.use_program(None);
            log::debug!("program {previous:?} deactivated");
        }
    }
}

fn set_attributes<D: DeviceContext>(device: &mut D, program: &ShaderProgram, enabled: bool) {
    for &attribute in &program.attributes {
        device.set_attribute_enabled(attribute, enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCommand, HeadlessDevice};

    fn setup() -> (HeadlessDevice, ProgramRegistry, TextureCache, RenderStateMachine) {
        let mut device = HeadlessDevice::new(320, 240);
        let programs = ProgramRegistry::new(&mut device).unwrap();
        device.clear_commands();
        (device, programs, TextureCache::new(), RenderStateMachine::new())
    }

    #[test]
    fn activating_the_active_mode_issues_no_calls() {
        let (mut device, programs, mut textures, mut state) = setup();
        state.activate(&mut device, &programs, &mut textures, ProgramKind::Solid);
        device.clear_commands();

        state.activate(&mut device, &programs, &mut textures, ProgramKind::Solid);
        assert!(device.commands().is_empty());
        assert_eq!(state.switches(), 1);
    }

    #[test]
    fn only_one_program_has_attributes_enabled() {
        let (mut device, programs, mut textures, mut state) = setup();
        for kind in [
            ProgramKind::Solid,
            ProgramKind::BatchImage,
            ProgramKind::SingleImage,
            ProgramKind::Solid,
        ] {
            let handle = state.activate(&mut device, &programs, &mut textures, kind);
            assert_eq!(device.enabled_program_count(), 1);
            assert!(device.enabled_attributes().all(|a| a.program == handle));
            assert_eq!(device.current_program(), Some(handle));
        }
        assert_eq!(state.switches(), 4);
    }

    #[test]
    fn outgoing_attributes_are_disabled_before_switching() {
        let (mut device, programs, mut textures, mut state) = setup();
        state.activate(&mut device, &programs, &mut textures, ProgramKind::Solid);
        device.clear_commands();

        let batch = state.activate(&mut device, &programs, &mut textures, ProgramKind::BatchImage);
        let cmds = device.commands();
        let use_at = cmds
            .iter()
            .position(|c| *c == DeviceCommand::UseProgram(Some(batch)))
            .unwrap();
        assert!(cmds[..use_at].iter().all(|c| matches!(c, DeviceCommand::DisableAttribute(_))));
        assert_eq!(use_at, 2);
    }

    #[test]
    fn deactivate_all_leaves_nothing_enabled() {
        let (mut device, programs, mut textures, mut state) = setup();
        state.activate(&mut device, &programs, &mut textures, ProgramKind::BatchImage);
        state.deactivate_all(&mut device, &programs);

        assert_eq!(state.active(), None);
        assert_eq!(device.enabled_program_count(), 0);
        assert_eq!(device.current_program(), None);
    }
}
