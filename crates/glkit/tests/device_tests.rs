use std::rc::Rc;

use glkit::{
    as_byte_slice, AttributeDescriptor, AttributeType, BufferUsage, Comparison, ContextConfig,
    ContextVersion, Device, Error, PrimitiveType, ProgramSource, TextureDesc, TextureFormat,
};
use glkit_core::testing::{Call, RecordingContext};

const VERTEX: &str = "attribute vec3 position; void main() { gl_Position = vec4(position, 1.0); }";
const FRAGMENT: &str = "void main() { gl_FragColor = vec4(1.0); }";

fn device() -> (Rc<RecordingContext>, Rc<Device>) {
    let gl = Rc::new(RecordingContext::new());
    let device = Device::new(gl.clone(), ContextConfig::default());
    (gl, device)
}

fn layout(slots: u32) -> Vec<AttributeDescriptor> {
    (0..slots)
        .map(|i| AttributeDescriptor::new(4, AttributeType::Float, 16 * slots, 16 * i))
        .collect()
}

#[test]
fn use_program_fires_once_per_run() {
    let (gl, device) = device();
    let a = device.create_program(&ProgramSource::new(VERTEX, FRAGMENT)).unwrap();
    let b = device.create_program(&ProgramSource::new(VERTEX, FRAGMENT)).unwrap();
    for program in [&a, &a, &b, &b, &a] {
        program.use_program().unwrap();
    }
    let used: Vec<_> = gl
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::UseProgram(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(used, vec![a.id(), b.id(), a.id()]);
}

#[test]
fn structurally_equal_layouts_share_identity() {
    let (_gl, device) = device();
    let first = device.create_attribute_buffer(&layout(3)).unwrap();
    // Offsets and locations do not take part in deduplication.
    let shifted: Vec<_> = layout(3)
        .into_iter()
        .enumerate()
        .map(|(i, d)| AttributeDescriptor { offset: 0, ..d }.at_location(2 - i as u32))
        .collect();
    let second = device.create_attribute_buffer(&shifted).unwrap();
    assert_eq!(first.id(), second.id());
}

#[test]
fn differing_layouts_get_distinct_identities() {
    let (_gl, device) = device();
    let base = layout(2);
    let longer = layout(3);
    let mut normalized = base.clone();
    normalized[1] = normalized[1].normalized();
    let mut retyped = base.clone();
    retyped[0].ty = AttributeType::HalfFloat;
    let mut restrided = base.clone();
    restrided[1].stride += 4;
    let mut resized = base.clone();
    resized[0].size = 3;

    let ids: Vec<_> = [&base, &longer, &normalized, &retyped, &restrided, &resized]
        .into_iter()
        .map(|d| device.create_attribute_buffer(d).unwrap().id())
        .collect();
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert_eq!(device.attribute_buffer_count(), 6);
}

#[test]
fn shrinking_from_five_to_two_slots() {
    let (gl, device) = device();
    let five = device.create_attribute_buffer(&layout(5)).unwrap();
    let two = device.create_attribute_buffer(&layout(2)).unwrap();
    device.state().enable_attributes(&five);
    gl.clear();

    device.state().enable_attributes(&two);
    let disabled: Vec<_> = gl
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::DisableVertexAttribArray(slot) => Some(slot),
            _ => None,
        })
        .collect();
    assert_eq!(disabled, vec![2, 3, 4]);
    assert_eq!(device.state().enabled_attributes(), 2);
}

#[test]
fn location_outside_layout_is_rejected() {
    let (gl, device) = device();
    let stray = [AttributeDescriptor::new(4, AttributeType::Float, 16, 0).at_location(3)];
    assert!(matches!(
        device.create_geometry(&stray, &[0u8; 16], BufferUsage::Static),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(device.attribute_buffer_count(), 0);
    assert_eq!(gl.count(|c| matches!(c, Call::VertexAttribPointer { .. })), 0);
}

#[test]
fn invalidate_never_suppresses_next_setter() {
    let (gl, device) = device();
    let mut state = device.state();
    state.bind_array_buffer(7);
    state.set_depth_write(false);
    state.invalidate();
    gl.clear();

    assert!(state.bind_array_buffer(7));
    assert!(state.set_depth_write(false));
    assert_eq!(
        gl.calls(),
        vec![
            Call::BindBuffer(gl::ARRAY_BUFFER, 7),
            Call::DepthMask(false),
        ]
    );
}

#[test]
fn handle_round_trip_yields_fresh_id() {
    let (_gl, device) = device();
    let weak = Rc::downgrade(&device);
    let mut texture = glkit::Texture::new();
    let desc = TextureDesc::new_2d(2, 2, TextureFormat::Rgba8);
    texture.initialize(&weak, desc, None).unwrap();
    let first = texture.id();
    texture.dispose();
    texture.dispose();
    texture.initialize(&weak, desc, None).unwrap();
    assert_ne!(texture.id(), 0);
    assert_ne!(texture.id(), first);
}

#[test]
fn texture_unit_three_rebinds_on_change_only() {
    let (gl, device) = device();
    let t1 = device
        .create_texture(TextureDesc::new_2d(1, 1, TextureFormat::Rgba8), None)
        .unwrap();
    let t2 = device
        .create_texture(TextureDesc::new_2d(1, 1, TextureFormat::Rgba8), None)
        .unwrap();
    gl.clear();

    t1.bind(3).unwrap();
    t1.bind(3).unwrap();
    assert_eq!(gl.count(|c| *c == Call::BindTexture(gl::TEXTURE_2D, t1.id())), 1);

    t2.bind(3).unwrap();
    assert_eq!(gl.count(|c| matches!(c, Call::BindTexture(..))), 2);
    assert_eq!(
        device.state().texture_binding(3).map(|b| b.texture),
        Some(t2.id())
    );
}

#[test]
fn depth_test_repeats_are_suppressed() {
    let (gl, device) = device();
    device.state().set_depth_test(true, Comparison::Less);
    device.state().set_depth_test(true, Comparison::Less);
    assert_eq!(gl.count(|c| *c == Call::Enable(gl::DEPTH_TEST)), 1);
    assert_eq!(gl.count(|c| *c == Call::DepthFunc(gl::LESS)), 1);
}

#[test]
fn disposing_bound_buffer_forces_next_bind() {
    let (gl, device) = device();
    let mut buffer = device
        .create_buffer(glkit::BufferKind::Array, BufferUsage::Static, Some(&[0u8; 8]))
        .unwrap();
    let id = buffer.id();
    buffer.bind().unwrap();
    buffer.dispose();
    assert_eq!(device.state().array_buffer(), None);

    // A driver may hand the released name to the next buffer.
    gl.clear();
    assert!(device.state().bind_array_buffer(id));
    assert_eq!(gl.calls(), vec![Call::BindBuffer(gl::ARRAY_BUFFER, id)]);
}

#[test]
fn textured_quad_frame() {
    let (gl, device) = device();

    #[repr(C)]
    #[derive(Clone, Copy)]
    struct Vertex {
        position: [f32; 3],
        uv: [f32; 2],
    }
    unsafe impl glkit::AsBytes for Vertex {}

    let quad = [
        Vertex { position: [-1.0, -1.0, 0.0], uv: [0.0, 0.0] },
        Vertex { position: [1.0, -1.0, 0.0], uv: [1.0, 0.0] },
        Vertex { position: [-1.0, 1.0, 0.0], uv: [0.0, 1.0] },
        Vertex { position: [1.0, 1.0, 0.0], uv: [1.0, 1.0] },
    ];
    let descriptors = [
        AttributeDescriptor::new(3, AttributeType::Float, 20, 0),
        AttributeDescriptor::new(2, AttributeType::Float, 20, 12),
    ];

    let program = device
        .create_program(
            &ProgramSource::new(VERTEX, FRAGMENT)
                .with_attribute_locations(&[("position", 0), ("uv", 1)]),
        )
        .unwrap();
    let texture = device
        .create_texture(TextureDesc::new_2d(2, 2, TextureFormat::Rgba8), Some(&[255u8; 16]))
        .unwrap();
    let geometry = device
        .create_geometry(&descriptors, as_byte_slice(&quad), BufferUsage::Static)
        .unwrap();

    for _ in 0..2 {
        device.state().set_clear_color(0.0, 0.0, 0.0, 1.0);
        device.clear(true, true, false);
        program.use_program().unwrap();
        texture.bind(0).unwrap();
        geometry.bind().unwrap();
        device.draw_primitive(PrimitiveType::TriangleStrip, 0, 2);
        device.end_frame();
    }

    assert_eq!(gl.count(|c| matches!(c, Call::DrawArrays { count: 4, .. })), 2);
    assert_eq!(gl.count(|c| matches!(c, Call::ClearColor(_))), 1);
    assert_eq!(gl.count(|c| matches!(c, Call::UseProgram(_))), 1);
    assert_eq!(device.frame_stats().draw_calls, 1);
    assert_eq!(device.frame_stats().primitives_of(PrimitiveType::TriangleStrip), 2);
}

#[test]
fn v1_context_without_extension_degrades() {
    let gl = Rc::new(RecordingContext::new().with_version(ContextVersion::V1));
    let device = Device::new(gl.clone(), ContextConfig::default());
    assert!(!device.supports_vertex_arrays());
    assert_eq!(
        device.state().create_vertex_array(),
        Err(Error::NotImplemented("create_vertex_array"))
    );

    let geometry = device
        .create_geometry(&layout(2), &[0u8; 64], BufferUsage::Static)
        .unwrap();
    assert_eq!(geometry.vertex_array(), 0);
    geometry.bind().unwrap();
    assert_eq!(device.state().enabled_attributes(), 2);
}

#[test]
fn unknown_codes_are_rejected() {
    assert_eq!(PrimitiveType::from_code(9), Err(Error::UnknownPrimitiveType(9)));
    assert_eq!(Comparison::from_code(8), Err(Error::UnknownComparison(8)));
    assert_eq!(
        AttributeType::from_gl(gl::INT),
        Err(Error::UnknownAttributeType(gl::INT))
    );
}
