use std::marker::PhantomData;
use std::mem::size_of;

use crate::geometry::{Geometry, Vertex};
use crate::gl::{BufferTarget, GlError, GraphicsApi};

use super::validate::{self, UploadReport};
use super::{BufferMode, RenderConfig};

// ── owned GL objects ──────────────────────────────────────────────────────

/// Vertex array object deleted on drop.
pub struct GpuVertexArray<'g, G: GraphicsApi> {
    gl: &'g G,
    raw: G::VertexArray,
}

impl<'g, G: GraphicsApi> GpuVertexArray<'g, G> {
    pub fn new(gl: &'g G) -> Result<Self, GlError> {
        let raw = gl.create_vertex_array()?;
        Ok(Self { gl, raw })
    }

    #[inline]
    pub fn raw(&self) -> G::VertexArray {
        self.raw
    }
}

impl<G: GraphicsApi> Drop for GpuVertexArray<'_, G> {
    fn drop(&mut self) {
        self.gl.delete_vertex_array(self.raw);
    }
}

/// Buffer object deleted on drop.
pub struct GpuBuffer<'g, G: GraphicsApi> {
    gl: &'g G,
    raw: G::Buffer,
}

impl<'g, G: GraphicsApi> GpuBuffer<'g, G> {
    pub fn new(gl: &'g G) -> Result<Self, GlError> {
        let raw = gl.create_buffer()?;
        Ok(Self { gl, raw })
    }

    #[inline]
    pub fn raw(&self) -> G::Buffer {
        self.raw
    }
}

impl<G: GraphicsApi> Drop for GpuBuffer<'_, G> {
    fn drop(&mut self) {
        self.gl.delete_buffer(self.raw);
    }
}

struct Handles<'g, G: GraphicsApi> {
    vertex_array: GpuVertexArray<'g, G>,
    vertex_buffer: GpuBuffer<'g, G>,
    index_buffer: GpuBuffer<'g, G>,
}

// ── stats ─────────────────────────────────────────────────────────────────

/// Counters over the manager's lifetime.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SyncStats {
    pub syncs: u64,
    pub vertex_reallocations: u64,
    pub index_reallocations: u64,
    /// Static-mode syncs whose data did not fit the first allocation.
    pub static_overflows: u64,
    /// Syncs that failed because the driver refused an allocation.
    pub failed_allocations: u64,
}

// ── manager ───────────────────────────────────────────────────────────────

/// Owns the vertex array, vertex buffer and index buffer of one display
/// surface and mirrors CPU geometry into them.
///
/// The three GL objects live exactly as long as the manager (or until
/// [`release`](Self::release)). Moving the manager moves them; assigning
/// over a live manager drops, and so deletes, the old objects first.
///
/// Capacities are element counts of the most recent allocation, tracked
/// separately for vertices and indices.
pub struct BufferManager<'g, G: GraphicsApi, V: Vertex> {
    gl: &'g G,
    mode: BufferMode,
    validate: bool,
    handles: Option<Handles<'g, G>>,

    vertex_capacity: Option<usize>,
    index_capacity: Option<usize>,
    element_count: usize,

    stats: SyncStats,
    last_report: Option<UploadReport>,
    _vertex: PhantomData<fn() -> V>,
}

/// What one buffer upload did.
struct Upload {
    reallocated: bool,
    elements: usize,
}

impl<'g, G: GraphicsApi, V: Vertex> BufferManager<'g, G, V> {
    /// Creates the GL objects and attaches both buffers to the vertex array.
    ///
    /// Fails only when the context cannot allocate an object. Objects
    /// created before the failure are deleted again.
    pub fn new(gl: &'g G, config: &RenderConfig) -> Result<Self, GlError> {
        let vertex_array = GpuVertexArray::new(gl)?;
        let vertex_buffer = GpuBuffer::new(gl)?;
        let index_buffer = GpuBuffer::new(gl)?;

        gl.bind_vertex_array(Some(vertex_array.raw()));
        gl.bind_buffer(BufferTarget::Array, Some(vertex_buffer.raw()));
        gl.bind_buffer(BufferTarget::ElementArray, Some(index_buffer.raw()));
        gl.bind_vertex_array(None);

        log::trace!(
            "buffer manager created: vao={:?} vbo={:?} ebo={:?} mode={:?}",
            vertex_array.raw(),
            vertex_buffer.raw(),
            index_buffer.raw(),
            config.buffer_mode
        );

        Ok(Self {
            gl,
            mode: config.buffer_mode,
            validate: config.validate_uploads,
            handles: Some(Handles { vertex_array, vertex_buffer, index_buffer }),
            vertex_capacity: None,
            index_capacity: None,
            element_count: 0,
            stats: SyncStats::default(),
            last_report: None,
            _vertex: PhantomData,
        })
    }

    /// Shorthand for a manager with only the buffer mode configured.
    pub fn with_mode(gl: &'g G, mode: BufferMode) -> Result<Self, GlError> {
        Self::new(gl, &RenderConfig { buffer_mode: mode, ..RenderConfig::default() })
    }

    /// Uploads `vertices` and `indices` so the GPU buffers mirror them.
    ///
    /// Per buffer: in streaming mode, data that fits the last allocation is
    /// written in place from offset 0; anything larger, and the first sync
    /// in either mode, reallocates to exactly the data's length. Shrinking
    /// never reallocates; bytes past the new length stay in GPU memory but
    /// are never drawn because the draw is bounded by `element_count()`.
    ///
    /// In static mode the first allocation is final. Larger data later is a
    /// caller error: it is logged and only the part that fits is uploaded.
    ///
    /// A refused allocation is returned as an error. That buffer then has no
    /// committed capacity, nothing is drawn until a later sync succeeds, and
    /// the next sync allocates again.
    ///
    /// Indices are not range-checked here. Syncing a released manager does
    /// nothing.
    pub fn sync(&mut self, vertices: &[V], indices: &[u32]) -> Result<(), GlError> {
        let Some(handles) = self.handles.as_ref() else {
            log::warn!("sync on a released buffer manager ignored");
            return Ok(());
        };
        let (vao, vbo, ebo) = (
            handles.vertex_array.raw(),
            handles.vertex_buffer.raw(),
            handles.index_buffer.raw(),
        );

        self.gl.bind_vertex_array(Some(vao));
        let result = self.upload_bound(vbo, ebo, vertices, indices);
        self.gl.bind_vertex_array(None);

        self.stats.syncs += 1;
        if let Err(e) = &result {
            self.element_count = 0;
            self.stats.failed_allocations += 1;
            log::error!("buffer sync failed, nothing will be drawn: {e}");
        }
        result
    }

    /// Body of `sync` with the vertex array bound.
    fn upload_bound(
        &mut self,
        vbo: G::Buffer,
        ebo: G::Buffer,
        vertices: &[V],
        indices: &[u32],
    ) -> Result<(), GlError> {
        let gl = self.gl;
        let pad = self.validate;

        gl.bind_buffer(BufferTarget::Array, Some(vbo));
        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let uploaded_vertices = upload(
            gl,
            BufferTarget::Array,
            vertex_bytes,
            size_of::<V>(),
            self.mode,
            pad,
            &mut self.vertex_capacity,
        )?;
        if uploaded_vertices.reallocated {
            // A fresh allocation may drop previously bound attribute state.
            V::map_attributes(gl);
            self.stats.vertex_reallocations += 1;
        }
        let vertex_check = self.validate.then(|| {
            validate::check_bound(
                gl,
                BufferTarget::Array,
                vertex_bytes,
                size_of::<V>(),
                uploaded_vertices.elements,
                self.vertex_capacity,
            )
        });

        gl.bind_buffer(BufferTarget::ElementArray, Some(ebo));
        let index_bytes: &[u8] = bytemuck::cast_slice(indices);
        let uploaded_indices = upload(
            gl,
            BufferTarget::ElementArray,
            index_bytes,
            size_of::<u32>(),
            self.mode,
            pad,
            &mut self.index_capacity,
        )?;
        if uploaded_indices.reallocated {
            self.stats.index_reallocations += 1;
        }
        let index_check = self.validate.then(|| {
            validate::check_bound(
                gl,
                BufferTarget::ElementArray,
                index_bytes,
                size_of::<u32>(),
                uploaded_indices.elements,
                self.index_capacity,
            )
        });

        let overflowed = uploaded_vertices.elements < vertices.len() || uploaded_indices.elements < indices.len();
        if overflowed {
            self.stats.static_overflows += 1;
        }
        self.element_count = uploaded_indices.elements;

        if let (Some(vertices), Some(indices)) = (vertex_check, index_check) {
            let report = UploadReport { vertices, indices };
            if !report.is_ok() {
                log::warn!("upload read-back mismatch: {report:?}");
            }
            self.last_report = Some(report);
        }
        Ok(())
    }

    /// Syncs the contents of `geometry`.
    pub fn sync_geometry(&mut self, geometry: &Geometry<V>) -> Result<(), GlError> {
        self.sync(geometry.vertices(), geometry.indices())
    }

    /// Draws everything uploaded by the last sync as indexed triangles.
    ///
    /// The caller binds the program and textures. Does nothing when there is
    /// nothing to draw or the manager was released.
    pub fn draw(&self) {
        let Some(handles) = self.handles.as_ref() else { return };
        if self.element_count == 0 {
            return;
        }
        self.gl.bind_vertex_array(Some(handles.vertex_array.raw()));
        self.gl.draw_elements_u32(self.element_count);
        self.gl.bind_vertex_array(None);
    }

    /// Deletes the GL objects now instead of on drop. Idempotent.
    pub fn release(&mut self) {
        if let Some(handles) = self.handles.take() {
            log::trace!(
                "buffer manager released: vao={:?} vbo={:?} ebo={:?}",
                handles.vertex_array.raw(),
                handles.vertex_buffer.raw(),
                handles.index_buffer.raw()
            );
            drop(handles);
        }
        self.vertex_capacity = None;
        self.index_capacity = None;
        self.element_count = 0;
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn vertex_array(&self) -> Option<G::VertexArray> {
        self.handles.as_ref().map(|h| h.vertex_array.raw())
    }

    pub fn vertex_buffer(&self) -> Option<G::Buffer> {
        self.handles.as_ref().map(|h| h.vertex_buffer.raw())
    }

    pub fn index_buffer(&self) -> Option<G::Buffer> {
        self.handles.as_ref().map(|h| h.index_buffer.raw())
    }

    /// Vertex count of the current vertex buffer allocation (0 before the first sync).
    pub fn committed_vertex_capacity(&self) -> usize {
        self.vertex_capacity.unwrap_or(0)
    }

    /// Index count of the current index buffer allocation (0 before the first sync).
    pub fn committed_index_capacity(&self) -> usize {
        self.index_capacity.unwrap_or(0)
    }

    /// Number of indices uploaded by the last sync; the draw count.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn mode(&self) -> BufferMode {
        self.mode
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Read-back results of the last sync, when validation is enabled.
    pub fn last_upload_report(&self) -> Option<UploadReport> {
        self.last_report
    }

    pub fn is_released(&self) -> bool {
        self.handles.is_none()
    }
}

/// Reuse-or-reallocate for the buffer currently bound to `target`.
///
/// `capacity` is only committed once the driver accepted the allocation; a
/// refusal leaves it `None` so the next sync allocates again.
fn upload<G: GraphicsApi>(
    gl: &G,
    target: BufferTarget,
    data: &[u8],
    element_size: usize,
    mode: BufferMode,
    pad: bool,
    capacity: &mut Option<usize>,
) -> Result<Upload, GlError> {
    let len = data.len() / element_size;

    match (*capacity, mode) {
        (Some(cap), BufferMode::Streaming) if len <= cap => {
            gl.buffer_sub_data(target, 0, data);
            Ok(Upload { reallocated: false, elements: len })
        }
        (Some(cap), BufferMode::Static) => {
            let elements = if len > cap {
                log::error!(
                    "static {target:?} buffer holds {cap} elements but {len} were synced; \
                     uploading the first {cap}"
                );
                cap
            } else {
                len
            };
            gl.buffer_sub_data(target, 0, &data[..elements * element_size]);
            Ok(Upload { reallocated: false, elements })
        }
        _ => {
            let previous = capacity.take();
            if pad {
                gl.buffer_data(target, &validate::padded(data, element_size), mode.usage())?;
            } else {
                gl.buffer_data(target, data, mode.usage())?;
            }
            log::debug!("{target:?} buffer allocated: {previous:?} -> {len} elements");
            *capacity = Some(len);
            Ok(Upload { reallocated: true, elements: len })
        }
    }
}
