use std::rc::Weak;

use gl::types::{GLint, GLuint};
use tracing::{debug, error};

use super::shader::{Shader, ShaderKind};
use crate::device::Device;
use crate::error::{Error, Result};

/// Sources and pre-link bindings for a [`Program`].
///
/// Either stage may be absent; a missing stage is simply not attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramSource<'a> {
    pub vertex: Option<&'a str>,
    pub fragment: Option<&'a str>,
    /// `(name, location)` pairs bound before linking.
    pub attribute_locations: &'a [(&'a str, u32)],
}

impl<'a> ProgramSource<'a> {
    pub fn new(vertex: &'a str, fragment: &'a str) -> Self {
        Self {
            vertex: Some(vertex),
            fragment: Some(fragment),
            attribute_locations: &[],
        }
    }

    pub fn with_attribute_locations(mut self, locations: &'a [(&'a str, u32)]) -> Self {
        self.attribute_locations = locations;
        self
    }
}

/// A linked program together with the shader objects it owns.
#[derive(Debug)]
pub struct Program {
    device: Weak<Device>,
    id: GLuint,
    vertex: Option<Shader>,
    fragment: Option<Shader>,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    pub fn new() -> Self {
        Self {
            device: Weak::new(),
            id: 0,
            vertex: None,
            fragment: None,
        }
    }

    /// Compile the provided stages, attach them and link.
    ///
    /// On any failure the program and every shader created so far are
    /// disposed before the error is returned.
    pub fn initialize(&mut self, device: &Weak<Device>, source: &ProgramSource<'_>) -> Result<()> {
        if self.id != 0 {
            return Err(Error::AlreadyInitialized);
        }
        let dev = device.upgrade().ok_or(Error::MissingContext)?;

        let id = dev
            .gl()
            .create_program()
            .ok_or(Error::AllocationFailed("program"))?;
        self.id = id;
        self.device = Weak::clone(device);

        if let Err(err) = self.attach_and_link(device, source) {
            self.dispose();
            return Err(err);
        }

        debug!(program = id, "program linked");
        Ok(())
    }

    fn attach_and_link(&mut self, device: &Weak<Device>, source: &ProgramSource<'_>) -> Result<()> {
        self.vertex = Self::stage(device, self.id, ShaderKind::Vertex, source.vertex)?;
        self.fragment = Self::stage(device, self.id, ShaderKind::Fragment, source.fragment)?;

        let dev = device.upgrade().ok_or(Error::MissingContext)?;
        let gl = dev.gl();
        for &(name, location) in source.attribute_locations {
            gl.bind_attrib_location(self.id, location, name);
        }

        gl.link_program(self.id);
        if !gl.program_link_status(self.id) {
            let log = gl.program_info_log(self.id);
            error!(program = self.id, "program link failed:\n{log}");
            return Err(Error::LinkFailure(log));
        }
        Ok(())
    }

    fn stage(
        device: &Weak<Device>,
        program: GLuint,
        kind: ShaderKind,
        source: Option<&str>,
    ) -> Result<Option<Shader>> {
        let Some(source) = source else {
            return Ok(None);
        };
        let mut shader = Shader::new(kind);
        // A failed shader drops here, which disposes it.
        shader.initialize(device, source)?;
        if let Some(dev) = device.upgrade() {
            dev.gl().attach_shader(program, shader.id());
        }
        Ok(Some(shader))
    }

    /// Make this the active program through the state cache.
    ///
    /// Returns whether a driver call was issued.
    pub fn use_program(&self) -> Result<bool> {
        let dev = self.device.upgrade().ok_or(Error::MissingContext)?;
        if self.id == 0 {
            return Err(Error::InvalidArgument("program is not initialized".into()));
        }
        let changed = dev.state().use_program(self.id);
        Ok(changed)
    }

    pub fn attribute_location(&self, name: &str) -> Option<GLuint> {
        let dev = self.device.upgrade()?;
        dev.gl().get_attrib_location(self.id, name)
    }

    pub fn uniform_location(&self, name: &str) -> Option<GLint> {
        let dev = self.device.upgrade()?;
        dev.gl().get_uniform_location(self.id, name)
    }

    /// Release the program and its shader objects. No-op when not initialized.
    pub fn dispose(&mut self) {
        if let Some(mut shader) = self.vertex.take() {
            shader.dispose();
        }
        if let Some(mut shader) = self.fragment.take() {
            shader.dispose();
        }
        if self.id == 0 {
            return;
        }
        if let Some(dev) = self.device.upgrade() {
            dev.gl().delete_program(self.id);
            dev.state().forget_program(self.id);
        }
        self.id = 0;
        self.device = Weak::new();
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    pub fn is_initialized(&self) -> bool {
        self.id != 0
    }

    pub fn vertex_shader(&self) -> Option<&Shader> {
        self.vertex.as_ref()
    }

    pub fn fragment_shader(&self) -> Option<&Shader> {
        self.fragment.as_ref()
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::testing::{Call, RecordingContext};
    use crate::ContextConfig;

    fn device() -> (Rc<RecordingContext>, Rc<Device>) {
        let gl = Rc::new(RecordingContext::new());
        let device = Device::new(gl.clone(), ContextConfig::default());
        (gl, device)
    }

    #[test]
    fn links_both_stages() {
        let (gl, device) = device();
        let mut program = Program::new();
        program
            .initialize(&Rc::downgrade(&device), &ProgramSource::new("vs", "fs"))
            .unwrap();

        assert!(program.is_initialized());
        assert_eq!(gl.count(|c| matches!(c, Call::AttachShader(..))), 2);
        assert_eq!(gl.count(|c| matches!(c, Call::LinkProgram(_))), 1);
        assert!(program.vertex_shader().is_some());
        assert!(program.fragment_shader().is_some());
    }

    #[test]
    fn missing_stages_are_skipped() {
        let (gl, device) = device();
        let mut program = Program::new();
        let source = ProgramSource {
            fragment: Some("fs"),
            ..Default::default()
        };
        program.initialize(&Rc::downgrade(&device), &source).unwrap();
        assert_eq!(gl.count(|c| matches!(c, Call::AttachShader(..))), 1);
        assert!(program.vertex_shader().is_none());

        let mut empty = Program::new();
        empty
            .initialize(&Rc::downgrade(&device), &ProgramSource::default())
            .unwrap();
        assert!(empty.is_initialized());
    }

    #[test]
    fn attribute_locations_bound_before_link() {
        let (gl, device) = device();
        let mut program = Program::new();
        let source = ProgramSource::new("vs", "fs").with_attribute_locations(&[("position", 0), ("uv", 1)]);
        program.initialize(&Rc::downgrade(&device), &source).unwrap();

        let calls = gl.calls();
        let bind = calls
            .iter()
            .position(|c| matches!(c, Call::BindAttribLocation(_, 1, name) if name == "uv"))
            .unwrap();
        let link = calls
            .iter()
            .position(|c| matches!(c, Call::LinkProgram(_)))
            .unwrap();
        assert!(bind < link);
        assert_eq!(program.attribute_location("uv"), Some(1));
    }

    #[test]
    fn link_failure_disposes_everything() {
        let (gl, device) = device();
        gl.fail_link(true);
        let mut program = Program::new();
        let err = program
            .initialize(&Rc::downgrade(&device), &ProgramSource::new("vs", "fs"))
            .unwrap_err();

        assert!(matches!(err, Error::LinkFailure(ref log) if log.contains("varying")));
        assert!(!program.is_initialized());
        assert_eq!(gl.count(|c| matches!(c, Call::DeleteProgram(_))), 1);
        assert_eq!(gl.count(|c| matches!(c, Call::DeleteShader(_))), 2);
    }

    #[test]
    fn compile_failure_disposes_program() {
        let (gl, device) = device();
        gl.fail_compile(true);
        let mut program = Program::new();
        let err = program
            .initialize(&Rc::downgrade(&device), &ProgramSource::new("vs", "fs"))
            .unwrap_err();

        assert!(matches!(err, Error::CompileFailure { kind: ShaderKind::Vertex, .. }));
        assert_eq!(gl.count(|c| matches!(c, Call::DeleteProgram(_))), 1);
        assert_eq!(gl.count(|c| matches!(c, Call::DeleteShader(_))), 1);
        assert_eq!(gl.count(|c| matches!(c, Call::LinkProgram(_))), 0);
    }

    #[test]
    fn use_program_goes_through_cache() {
        let (gl, device) = device();
        let mut program = Program::new();
        program
            .initialize(&Rc::downgrade(&device), &ProgramSource::new("vs", "fs"))
            .unwrap();
        assert_eq!(program.use_program(), Ok(true));
        assert_eq!(program.use_program(), Ok(false));
        assert_eq!(gl.count(|c| matches!(c, Call::UseProgram(_))), 1);
    }

    #[test]
    fn dispose_forgets_active_program() {
        let (gl, device) = device();
        let weak = Rc::downgrade(&device);
        let mut program = Program::new();
        program.initialize(&weak, &ProgramSource::new("vs", "fs")).unwrap();
        program.use_program().unwrap();
        program.dispose();
        assert_eq!(device.state().program(), None);

        program.initialize(&weak, &ProgramSource::new("vs", "fs")).unwrap();
        assert_eq!(program.use_program(), Ok(true));
        assert_eq!(gl.count(|c| matches!(c, Call::UseProgram(_))), 2);
    }
}
