//! Upload read-back checks.
//!
//! Some drivers (Zink on certain Mesa versions) were seen to corrupt the
//! tail of freshly allocated buffers. With `RenderConfig::validate_uploads`
//! set, every allocation carries one extra zeroed element, and after each
//! sync the first element, the last element and that pad are read back and
//! compared with the CPU copy. None of this runs on the default path.

use crate::gl::{BufferTarget, GraphicsApi};

/// Result of reading one buffer back.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferCheck {
    /// Nothing was uploaded, nothing to compare.
    Empty,
    /// The backend cannot read GPU memory back.
    Unreadable,
    Checked {
        first_ok: bool,
        last_ok: bool,
        /// `None` when the allocation carries no pad element.
        padding_ok: Option<bool>,
    },
}

impl BufferCheck {
    pub fn is_ok(self) -> bool {
        match self {
            BufferCheck::Checked { first_ok, last_ok, padding_ok } => {
                first_ok && last_ok && padding_ok != Some(false)
            }
            BufferCheck::Empty | BufferCheck::Unreadable => true,
        }
    }
}

/// Read-back results for the last sync.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UploadReport {
    pub vertices: BufferCheck,
    pub indices: BufferCheck,
}

impl UploadReport {
    pub fn is_ok(&self) -> bool {
        self.vertices.is_ok() && self.indices.is_ok()
    }
}

/// `data` followed by one zeroed element.
pub(crate) fn padded(data: &[u8], element_size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + element_size);
    out.extend_from_slice(data);
    out.resize(data.len() + element_size, 0);
    out
}

/// Compares the buffer bound to `target` with the first `uploaded` elements
/// of `data`. `pad_at` is the element position of the pad, if any.
pub(crate) fn check_bound<G: GraphicsApi>(
    gl: &G,
    target: BufferTarget,
    data: &[u8],
    element_size: usize,
    uploaded: usize,
    pad_at: Option<usize>,
) -> BufferCheck {
    if uploaded == 0 || element_size == 0 {
        return BufferCheck::Empty;
    }

    let last_offset = (uploaded - 1) * element_size;
    let Some(gpu_first) = gl.read_buffer(target, 0, element_size) else {
        return BufferCheck::Unreadable;
    };
    let gpu_last = gl.read_buffer(target, last_offset, element_size);

    let first_ok = gpu_first.as_slice() == &data[..element_size];
    let last_ok = gpu_last.as_deref() == Some(&data[last_offset..last_offset + element_size]);
    let padding_ok = pad_at.map(|at| {
        gl.read_buffer(target, at * element_size, element_size)
            .is_some_and(|pad| pad.iter().all(|&b| b == 0))
    });

    BufferCheck::Checked { first_ok, last_ok, padding_ok }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{BufferUsage, HeadlessDevice};

    #[test]
    fn padded_appends_one_zero_element() {
        assert_eq!(padded(&[1, 2, 3, 4], 2), vec![1, 2, 3, 4, 0, 0]);
        assert_eq!(padded(&[], 4), vec![0, 0, 0, 0]);
    }

    #[test]
    fn matching_upload_checks_ok() {
        let gl = HeadlessDevice::new();
        let b = gl.create_buffer().unwrap();
        gl.bind_buffer(BufferTarget::Array, Some(b));
        let data = [1u8, 1, 2, 2, 3, 3];
        gl.buffer_data(BufferTarget::Array, &padded(&data, 2), BufferUsage::Stream).unwrap();

        let check = check_bound(&gl, BufferTarget::Array, &data, 2, 3, Some(3));
        assert_eq!(
            check,
            BufferCheck::Checked { first_ok: true, last_ok: true, padding_ok: Some(true) }
        );
    }

    #[test]
    fn clobbered_pad_is_reported() {
        let gl = HeadlessDevice::new();
        let b = gl.create_buffer().unwrap();
        gl.bind_buffer(BufferTarget::Array, Some(b));
        let data = [7u8, 7];
        gl.buffer_data(BufferTarget::Array, &padded(&data, 2), BufferUsage::Stream).unwrap();
        gl.buffer_sub_data(BufferTarget::Array, 2, &[9, 9]);

        let check = check_bound(&gl, BufferTarget::Array, &data, 2, 1, Some(1));
        assert!(!check.is_ok());
    }

    #[test]
    fn nothing_uploaded_is_empty() {
        let gl = HeadlessDevice::new();
        assert_eq!(check_bound(&gl, BufferTarget::Array, &[], 4, 0, None), BufferCheck::Empty);
    }
}
