use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

use glam::Mat4;

use crate::geometry::{VertexAttribute, Winding};
use crate::resources::TextureImage;

use super::{BufferTarget, BufferUsage, GlError, GraphicsApi, ObjectKind, ShaderStage};

/// Object name handed out by [`HeadlessDevice`]. Never zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessHandle(u32);

impl HeadlessHandle {
    pub fn id(self) -> u32 {
        self.0
    }
}

/// Running totals of what the device was asked to do.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DeviceCounters {
    pub vertex_arrays_created: usize,
    pub vertex_arrays_deleted: usize,
    pub buffers_created: usize,
    pub buffers_deleted: usize,
    pub programs_created: usize,
    pub programs_deleted: usize,
    pub textures_created: usize,
    pub textures_deleted: usize,
    /// Successful `buffer_data` calls (full allocations).
    pub buffer_allocations: usize,
    /// `buffer_data` calls refused as out of memory.
    pub buffer_allocation_failures: usize,
    /// `buffer_sub_data` calls (in-place updates).
    pub buffer_updates: usize,
    /// `vertex_attrib_pointer` calls.
    pub attribute_mappings: usize,
    pub draws: usize,
}

impl DeviceCounters {
    /// Objects created and not yet deleted, across all kinds.
    pub fn live_objects(&self) -> usize {
        (self.vertex_arrays_created + self.buffers_created + self.programs_created + self.textures_created)
            - (self.vertex_arrays_deleted + self.buffers_deleted + self.programs_deleted + self.textures_deleted)
    }
}

/// A call a real driver would reject with a GL error.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidOperation {
    /// Handle was never created or was already deleted.
    UnknownHandle { kind: ObjectKind, id: u32 },
    NoBufferBound { target: BufferTarget },
    /// Sub-data or read-back range outside the buffer's allocation.
    OutOfRange { target: BufferTarget, offset: usize, len: usize, allocated: usize },
    DrawWithoutVertexArray,
    /// An index read by a draw call points past the vertex buffer.
    IndexOutOfBounds { index: u32, vertex_count: usize },
}

/// A recorded `draw_elements_u32` call with the state it observed.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub vertex_array: Option<HeadlessHandle>,
    pub program: Option<HeadlessHandle>,
    pub texture: Option<HeadlessHandle>,
    pub front_face: Winding,
    pub element_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct AttributeBinding {
    attribute: VertexAttribute,
    stride: usize,
    source: Option<HeadlessHandle>,
    enabled: bool,
}

#[derive(Debug, Default)]
struct VertexArrayState {
    element_buffer: Option<HeadlessHandle>,
    attributes: BTreeMap<u32, AttributeBinding>,
}

#[derive(Debug, Default)]
struct BufferStore {
    data: Vec<u8>,
    usage: Option<BufferUsage>,
}

#[derive(Debug)]
struct State {
    next_id: u32,
    fail_after: Option<usize>,
    // Remaining `buffer_data` calls to refuse.
    refuse_buffer_data: usize,

    vertex_arrays: HashMap<HeadlessHandle, VertexArrayState>,
    buffers: HashMap<HeadlessHandle, BufferStore>,
    programs: HashSet<HeadlessHandle>,
    textures: HashMap<HeadlessHandle, (u32, u32)>,

    bound_vertex_array: Option<HeadlessHandle>,
    array_buffer: Option<HeadlessHandle>,
    // Element binding while no vertex array is bound.
    loose_element_buffer: Option<HeadlessHandle>,
    program: Option<HeadlessHandle>,
    texture_units: HashMap<u32, HeadlessHandle>,
    front_face: Winding,
    uniforms_i32: HashMap<(HeadlessHandle, String), i32>,
    uniforms_mat4: HashMap<(HeadlessHandle, String), Mat4>,

    counters: DeviceCounters,
    invalid: Vec<InvalidOperation>,
    draws: Vec<DrawCall>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            next_id: 1,
            fail_after: None,
            refuse_buffer_data: 0,
            vertex_arrays: HashMap::new(),
            buffers: HashMap::new(),
            programs: HashSet::new(),
            textures: HashMap::new(),
            bound_vertex_array: None,
            array_buffer: None,
            loose_element_buffer: None,
            program: None,
            texture_units: HashMap::new(),
            // GL default.
            front_face: Winding::CounterClockwise,
            uniforms_i32: HashMap::new(),
            uniforms_mat4: HashMap::new(),
            counters: DeviceCounters::default(),
            invalid: Vec::new(),
            draws: Vec::new(),
        }
    }
}

impl State {
    fn allocate(&mut self, kind: ObjectKind) -> Result<HeadlessHandle, GlError> {
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                return Err(GlError::allocation(kind, "headless device: injected allocation failure"));
            }
            Some(n) => self.fail_after = Some(n - 1),
            None => {}
        }
        let handle = HeadlessHandle(self.next_id);
        self.next_id += 1;
        Ok(handle)
    }

    fn invalid(&mut self, op: InvalidOperation) {
        log::warn!("headless GL: invalid operation {op:?}");
        self.invalid.push(op);
    }

    fn bound(&self, target: BufferTarget) -> Option<HeadlessHandle> {
        match target {
            BufferTarget::Array => self.array_buffer,
            BufferTarget::ElementArray => match self.bound_vertex_array {
                Some(vao) => self.vertex_arrays.get(&vao).and_then(|v| v.element_buffer),
                None => self.loose_element_buffer,
            },
        }
    }

    fn bound_store(&mut self, target: BufferTarget) -> Option<&mut BufferStore> {
        match self.bound(target) {
            Some(handle) => self.buffers.get_mut(&handle),
            None => {
                self.invalid(InvalidOperation::NoBufferBound { target });
                None
            }
        }
    }
}

/// Software stand-in for a GL context.
///
/// Keeps the object table, binding points and buffer contents the way a
/// driver would, and records everything a driver would reject instead of
/// corrupting memory. Used for tests and for dry-running the panel without a
/// display.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    state: RefCell<State>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets the next `successes` object allocations succeed and fails the one
    /// after that. Later allocations succeed again.
    pub fn fail_allocation_after(&self, successes: usize) {
        self.state.borrow_mut().fail_after = Some(successes);
    }

    /// Refuses the next `count` buffer allocations as out of memory. A
    /// refused allocation leaves the buffer with no storage.
    pub fn fail_buffer_data(&self, count: usize) {
        self.state.borrow_mut().refuse_buffer_data = count;
    }

    pub fn counters(&self) -> DeviceCounters {
        self.state.borrow().counters
    }

    /// Everything the device refused so far, oldest first.
    pub fn invalid_operations(&self) -> Vec<InvalidOperation> {
        self.state.borrow().invalid.clone()
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    /// Current contents of a buffer, `None` if it does not exist.
    pub fn buffer_contents(&self, buffer: HeadlessHandle) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).map(|b| b.data.clone())
    }

    pub fn buffer_usage(&self, buffer: HeadlessHandle) -> Option<BufferUsage> {
        self.state.borrow().buffers.get(&buffer).and_then(|b| b.usage)
    }

    /// Buffer attached as the element buffer of `vertex_array`.
    pub fn element_buffer_of(&self, vertex_array: HeadlessHandle) -> Option<HeadlessHandle> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|v| v.element_buffer)
    }

    /// Enabled attributes recorded on `vertex_array`, ordered by location,
    /// with the stride and source buffer each was mapped with.
    pub fn enabled_attributes(
        &self,
        vertex_array: HeadlessHandle,
    ) -> Vec<(VertexAttribute, usize, Option<HeadlessHandle>)> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .map(|v| {
                v.attributes
                    .values()
                    .filter(|b| b.enabled)
                    .map(|b| (b.attribute, b.stride, b.source))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn uniform_i32(&self, program: HeadlessHandle, name: &str) -> Option<i32> {
        self.state
            .borrow()
            .uniforms_i32
            .get(&(program, name.to_string()))
            .copied()
    }

    pub fn uniform_mat4(&self, program: HeadlessHandle, name: &str) -> Option<Mat4> {
        self.state
            .borrow()
            .uniforms_mat4
            .get(&(program, name.to_string()))
            .copied()
    }

    pub fn texture_size(&self, texture: HeadlessHandle) -> Option<(u32, u32)> {
        self.state.borrow().textures.get(&texture).copied()
    }
}

fn check_source(stage: ShaderStage, src: &str) -> Result<(), GlError> {
    if src.contains("void main") {
        Ok(())
    } else {
        Err(GlError::ShaderCompile {
            stage,
            log: "0:1(1): error: function `main' is not defined".to_string(),
        })
    }
}

impl GraphicsApi for HeadlessDevice {
    type VertexArray = HeadlessHandle;
    type Buffer = HeadlessHandle;
    type Program = HeadlessHandle;
    type Texture = HeadlessHandle;

    fn create_vertex_array(&self) -> Result<HeadlessHandle, GlError> {
        let mut s = self.state.borrow_mut();
        let handle = s.allocate(ObjectKind::VertexArray)?;
        s.vertex_arrays.insert(handle, VertexArrayState::default());
        s.counters.vertex_arrays_created += 1;
        Ok(handle)
    }

    fn delete_vertex_array(&self, vertex_array: HeadlessHandle) {
        let mut s = self.state.borrow_mut();
        if s.vertex_arrays.remove(&vertex_array).is_none() {
            s.invalid(InvalidOperation::UnknownHandle { kind: ObjectKind::VertexArray, id: vertex_array.0 });
            return;
        }
        if s.bound_vertex_array == Some(vertex_array) {
            s.bound_vertex_array = None;
        }
        s.counters.vertex_arrays_deleted += 1;
    }

    fn bind_vertex_array(&self, vertex_array: Option<HeadlessHandle>) {
        let mut s = self.state.borrow_mut();
        if let Some(v) = vertex_array {
            if !s.vertex_arrays.contains_key(&v) {
                s.invalid(InvalidOperation::UnknownHandle { kind: ObjectKind::VertexArray, id: v.0 });
                return;
            }
        }
        s.bound_vertex_array = vertex_array;
    }

    fn create_buffer(&self) -> Result<HeadlessHandle, GlError> {
        let mut s = self.state.borrow_mut();
        let handle = s.allocate(ObjectKind::Buffer)?;
        s.buffers.insert(handle, BufferStore::default());
        s.counters.buffers_created += 1;
        Ok(handle)
    }

    fn delete_buffer(&self, buffer: HeadlessHandle) {
        let mut s = self.state.borrow_mut();
        if s.buffers.remove(&buffer).is_none() {
            s.invalid(InvalidOperation::UnknownHandle { kind: ObjectKind::Buffer, id: buffer.0 });
            return;
        }
        // Deleting a buffer unbinds it everywhere it is attached.
        if s.array_buffer == Some(buffer) {
            s.array_buffer = None;
        }
        if s.loose_element_buffer == Some(buffer) {
            s.loose_element_buffer = None;
        }
        for vao in s.vertex_arrays.values_mut() {
            if vao.element_buffer == Some(buffer) {
                vao.element_buffer = None;
            }
        }
        s.counters.buffers_deleted += 1;
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<HeadlessHandle>) {
        let mut s = self.state.borrow_mut();
        if let Some(b) = buffer {
            if !s.buffers.contains_key(&b) {
                s.invalid(InvalidOperation::UnknownHandle { kind: ObjectKind::Buffer, id: b.0 });
                return;
            }
        }
        match target {
            BufferTarget::Array => s.array_buffer = buffer,
            BufferTarget::ElementArray => match s.bound_vertex_array {
                Some(vao) => {
                    if let Some(v) = s.vertex_arrays.get_mut(&vao) {
                        v.element_buffer = buffer;
                    }
                }
                None => s.loose_element_buffer = buffer,
            },
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> Result<(), GlError> {
        let mut s = self.state.borrow_mut();
        let refuse = s.refuse_buffer_data > 0;
        let Some(store) = s.bound_store(target) else {
            return Err(GlError::BufferAllocation {
                target,
                bytes: data.len(),
                reason: "no buffer bound".to_string(),
            });
        };
        if refuse {
            store.data.clear();
            store.usage = None;
            s.refuse_buffer_data -= 1;
            s.counters.buffer_allocation_failures += 1;
            return Err(GlError::BufferAllocation {
                target,
                bytes: data.len(),
                reason: "headless device: injected GL_OUT_OF_MEMORY".to_string(),
            });
        }
        store.data = data.to_vec();
        store.usage = Some(usage);
        s.counters.buffer_allocations += 1;
        Ok(())
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        let mut s = self.state.borrow_mut();
        let Some(store) = s.bound_store(target) else { return };
        let allocated = store.data.len();
        match offset.checked_add(data.len()) {
            Some(end) if end <= allocated => {
                store.data[offset..end].copy_from_slice(data);
                s.counters.buffer_updates += 1;
            }
            _ => s.invalid(InvalidOperation::OutOfRange { target, offset, len: data.len(), allocated }),
        }
    }

    fn read_buffer(&self, target: BufferTarget, offset: usize, len: usize) -> Option<Vec<u8>> {
        let s = self.state.borrow();
        let store = s.bound(target).and_then(|b| s.buffers.get(&b))?;
        let end = offset.checked_add(len)?;
        store.data.get(offset..end).map(<[u8]>::to_vec)
    }

    fn vertex_attrib_pointer(&self, attribute: &VertexAttribute, stride: usize) {
        let mut s = self.state.borrow_mut();
        let Some(vao) = s.bound_vertex_array else {
            s.invalid(InvalidOperation::DrawWithoutVertexArray);
            return;
        };
        let source = s.array_buffer;
        if let Some(v) = s.vertex_arrays.get_mut(&vao) {
            let enabled = v.attributes.get(&attribute.location).is_some_and(|b| b.enabled);
            v.attributes.insert(
                attribute.location,
                AttributeBinding { attribute: *attribute, stride, source, enabled },
            );
        }
        s.counters.attribute_mappings += 1;
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        let mut s = self.state.borrow_mut();
        let Some(vao) = s.bound_vertex_array else {
            s.invalid(InvalidOperation::DrawWithoutVertexArray);
            return;
        };
        if let Some(binding) = s
            .vertex_arrays
            .get_mut(&vao)
            .and_then(|v| v.attributes.get_mut(&location))
        {
            binding.enabled = true;
        }
    }

    fn create_program(&self, vertex_src: &str, fragment_src: &str) -> Result<HeadlessHandle, GlError> {
        check_source(ShaderStage::Vertex, vertex_src)?;
        check_source(ShaderStage::Fragment, fragment_src)?;
        let mut s = self.state.borrow_mut();
        let handle = s.allocate(ObjectKind::Program)?;
        s.programs.insert(handle);
        s.counters.programs_created += 1;
        Ok(handle)
    }

    fn delete_program(&self, program: HeadlessHandle) {
        let mut s = self.state.borrow_mut();
        if !s.programs.remove(&program) {
            s.invalid(InvalidOperation::UnknownHandle { kind: ObjectKind::Program, id: program.0 });
            return;
        }
        if s.program == Some(program) {
            s.program = None;
        }
        s.uniforms_i32.retain(|(p, _), _| *p != program);
        s.uniforms_mat4.retain(|(p, _), _| *p != program);
        s.counters.programs_deleted += 1;
    }

    fn use_program(&self, program: Option<HeadlessHandle>) {
        self.state.borrow_mut().program = program;
    }

    fn set_uniform_i32(&self, program: HeadlessHandle, name: &str, value: i32) {
        self.state
            .borrow_mut()
            .uniforms_i32
            .insert((program, name.to_string()), value);
    }

    fn set_uniform_mat4(&self, program: HeadlessHandle, name: &str, value: &Mat4) {
        self.state
            .borrow_mut()
            .uniforms_mat4
            .insert((program, name.to_string()), *value);
    }

    fn create_texture_rgba(&self, image: &TextureImage) -> Result<HeadlessHandle, GlError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(GlError::Texture { reason: "zero-sized image".to_string() });
        }
        let mut s = self.state.borrow_mut();
        let handle = s.allocate(ObjectKind::Texture)?;
        s.textures.insert(handle, (image.width(), image.height()));
        s.counters.textures_created += 1;
        Ok(handle)
    }

    fn delete_texture(&self, texture: HeadlessHandle) {
        let mut s = self.state.borrow_mut();
        if s.textures.remove(&texture).is_none() {
            s.invalid(InvalidOperation::UnknownHandle { kind: ObjectKind::Texture, id: texture.0 });
            return;
        }
        s.texture_units.retain(|_, t| *t != texture);
        s.counters.textures_deleted += 1;
    }

    fn bind_texture(&self, unit: u32, texture: Option<HeadlessHandle>) {
        let mut s = self.state.borrow_mut();
        match texture {
            Some(t) => {
                s.texture_units.insert(unit, t);
            }
            None => {
                s.texture_units.remove(&unit);
            }
        }
    }

    fn front_face(&self) -> Winding {
        self.state.borrow().front_face
    }

    fn set_front_face(&self, winding: Winding) {
        self.state.borrow_mut().front_face = winding;
    }

    fn draw_elements_u32(&self, count: usize) {
        let mut s = self.state.borrow_mut();
        let Some(vao) = s.bound_vertex_array else {
            s.invalid(InvalidOperation::DrawWithoutVertexArray);
            return;
        };

        let indices: Option<Vec<u32>> = s.bound(BufferTarget::ElementArray).and_then(|ebo| {
            let data = &s.buffers.get(&ebo)?.data;
            data.get(..count * 4).map(bytemuck::pod_collect_to_vec)
        });
        let Some(indices) = indices else {
            let allocated = s
                .bound(BufferTarget::ElementArray)
                .and_then(|b| s.buffers.get(&b))
                .map_or(0, |b| b.data.len());
            s.invalid(InvalidOperation::OutOfRange {
                target: BufferTarget::ElementArray,
                offset: 0,
                len: count * 4,
                allocated,
            });
            return;
        };

        // Vertex count as seen through attribute 0, if it is mapped.
        let vertex_count = s
            .vertex_arrays
            .get(&vao)
            .and_then(|v| v.attributes.get(&0))
            .filter(|b| b.enabled && b.stride > 0)
            .and_then(|b| b.source.and_then(|src| s.buffers.get(&src)).map(|buf| buf.data.len() / b.stride));
        if let Some(vertex_count) = vertex_count {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                s.invalid(InvalidOperation::IndexOutOfBounds { index, vertex_count });
            }
        }

        let call = DrawCall {
            vertex_array: Some(vao),
            program: s.program,
            texture: s.texture_units.get(&0).copied(),
            front_face: s.front_face,
            element_count: count,
        };
        s.draws.push(call);
        s.counters.draws += 1;
    }
}
