use std::cell::{Cell, RefCell};
use std::fmt;

/// Hard ceiling on serialized output size.
///
/// Writes past the cap are dropped and the writer is marked overflowed
/// instead of silently truncating mid-token; callers observe the flag when
/// they extract the output.
pub const MAX_OUTPUT_SIZE: usize = i32::MAX as usize;

/// An output buffer with pluggable backing storage.
///
/// Can be backed by an owned buffer, a caller's `Vec<u8>` (appending after
/// its existing content), or a `dyn std::io::Write` which receives the
/// content on finish.
///
/// `push` is guaranteed to keep the pushed byte available, so the most
/// recently written byte can still be inspected and rewritten. The structural
/// helpers in [`crate::TextWriter`] rely on this for comma handling.
pub struct BytesWriter<'a> {
    backing: Backing<'a>,
    overflowed: bool,
}

enum Backing<'a> {
    Owned(Vec<u8>),
    Vec {
        vec: &'a mut Vec<u8>,
        start: usize,
    },
    Write {
        buffer: Vec<u8>,
        writer: &'a mut (dyn std::io::Write + Send),
    },
}

impl Default for BytesWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> From<&'a mut Vec<u8>> for BytesWriter<'a> {
    fn from(value: &'a mut Vec<u8>) -> Self {
        BytesWriter {
            backing: Backing::Vec {
                start: value.len(),
                vec: value,
            },
            overflowed: false,
        }
    }
}

impl fmt::Debug for BytesWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BytesWriter")
            .field("len", &self.len())
            .field("overflowed", &self.overflowed)
            .finish()
    }
}

impl<'a> BytesWriter<'a> {
    pub fn new() -> BytesWriter<'a> {
        BytesWriter {
            backing: Backing::Owned(Vec::new()),
            overflowed: false,
        }
    }

    pub fn with_capacity(capacity: usize) -> BytesWriter<'a> {
        BytesWriter {
            backing: Backing::Owned(Vec::with_capacity(capacity)),
            overflowed: false,
        }
    }

    /// Creates a writer whose content is sent to `writer` on finish.
    pub fn new_writer(writer: &'a mut (dyn std::io::Write + Send)) -> BytesWriter<'a> {
        BytesWriter {
            backing: Backing::Write {
                buffer: Vec::with_capacity(4096),
                writer,
            },
            overflowed: false,
        }
    }

    fn buffer(&self) -> &Vec<u8> {
        match &self.backing {
            Backing::Owned(vec) => vec,
            Backing::Vec { vec, .. } => vec,
            Backing::Write { buffer, .. } => buffer,
        }
    }

    fn buffer_mut(&mut self) -> &mut Vec<u8> {
        match &mut self.backing {
            Backing::Owned(vec) => vec,
            Backing::Vec { vec, .. } => vec,
            Backing::Write { buffer, .. } => buffer,
        }
    }

    /// True once any write has been dropped for exceeding
    /// [`MAX_OUTPUT_SIZE`]. The flag never resets for the writer's lifetime.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    pub fn clear(&mut self) {
        match &mut self.backing {
            Backing::Owned(vec) => vec.clear(),
            Backing::Vec { vec, start } => vec.truncate(*start),
            Backing::Write { buffer, .. } => buffer.clear(),
        }
    }

    /// Returns the current contents. For borrowed backing this includes the
    /// content that was already present.
    pub fn buffer_slice(&self) -> &[u8] {
        self.buffer()
    }

    /// Returns a mutable reference to the last byte, if available.
    pub fn last(&mut self) -> Option<&mut u8> {
        self.buffer_mut().last_mut()
    }

    #[inline]
    pub fn push(&mut self, byte: u8) {
        if self.buffer().len() >= MAX_OUTPUT_SIZE {
            self.overflowed = true;
            return;
        }
        self.buffer_mut().push(byte);
    }

    #[inline]
    pub fn push_bytes(&mut self, data: &[u8]) {
        if MAX_OUTPUT_SIZE - self.buffer().len() < data.len() {
            self.overflowed = true;
            return;
        }
        self.buffer_mut().extend_from_slice(data);
    }

    /// Converts the writer into a `Vec<u8>`, consuming the writer.
    ///
    /// For borrowed backing the caller's vector is taken whole.
    pub fn into_vec(self) -> Vec<u8> {
        match self.backing {
            Backing::Owned(vec) => vec,
            Backing::Vec { vec, .. } => std::mem::take(vec),
            Backing::Write { buffer, .. } => buffer,
        }
    }

    /// Consumes the writer and returns the slice of the caller's vector that
    /// was appended after the writer was created.
    ///
    /// # Panics
    /// Panics if the writer is not backed by a `Vec<u8>`.
    pub fn into_backed_with_extended_slice(self) -> &'a [u8] {
        match self.backing {
            Backing::Vec { vec, start } => &vec[start..],
            _ => panic!("Expected write buffer to be backed by a Vec<u8>"),
        }
    }

    /// Sends the buffered content to the backing writer and returns the
    /// number of bytes written.
    ///
    /// # Panics
    /// Panics if the writer is not backed by a `dyn io::Write`.
    pub fn into_write_finish(self) -> Result<usize, std::io::Error> {
        match self.backing {
            Backing::Write { buffer, writer } => {
                writer.write_all(&buffer)?;
                Ok(buffer.len())
            }
            _ => panic!("Expected write buffer to be backed by a writer"),
        }
    }
}

impl fmt::Write for BytesWriter<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        BytesWriter::push_bytes(self, s.as_bytes());
        Ok(())
    }
}

const POOL_RETAIN_CAPACITY: usize = 1 << 20;

thread_local! {
    static POOL_IN_USE: Cell<bool> = const { Cell::new(false) };
    static POOL_BUFFER: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

/// A scratch output buffer, pooled per thread.
///
/// The pool holds a single buffer guarded by an in-use flag. Re-entrant
/// acquisition, such as serializing from within a serializer, gets a fresh
/// unpooled buffer instead of corrupting the one in flight. Dropping the
/// guard returns a pooled buffer with its capacity retained.
pub(crate) struct ScratchBuffer {
    pub vec: Vec<u8>,
    pooled: bool,
}

pub(crate) fn acquire_scratch() -> ScratchBuffer {
    if POOL_IN_USE.with(|flag| flag.replace(true)) {
        return ScratchBuffer {
            vec: Vec::new(),
            pooled: false,
        };
    }
    let vec = POOL_BUFFER.with(|cell| std::mem::take(&mut *cell.borrow_mut()));
    ScratchBuffer { vec, pooled: true }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        if !self.pooled {
            return;
        }
        let mut vec = std::mem::take(&mut self.vec);
        vec.clear();
        if vec.capacity() > POOL_RETAIN_CAPACITY {
            vec = Vec::new();
        }
        POOL_BUFFER.with(|cell| *cell.borrow_mut() = vec);
        POOL_IN_USE.with(|flag| flag.set(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_backing_appends_after_existing_content() {
        let mut vec = b"prefix:".to_vec();
        let mut writer = BytesWriter::from(&mut vec);
        writer.push_bytes(b"abc");
        writer.push(b'!');
        assert_eq!(writer.into_backed_with_extended_slice(), b"abc!");
        assert_eq!(vec, b"prefix:abc!");
    }

    #[test]
    fn last_byte_can_be_rewritten() {
        let mut writer = BytesWriter::new();
        writer.push_bytes(b"[1,");
        *writer.last().unwrap() = b']';
        assert_eq!(writer.buffer_slice(), b"[1]");
    }

    #[test]
    fn pooled_scratch_is_exclusive() {
        let first = acquire_scratch();
        let second = acquire_scratch();
        assert!(first.pooled);
        assert!(!second.pooled);
        drop(second);
        drop(first);
        let again = acquire_scratch();
        assert!(again.pooled);
    }

    #[test]
    fn pool_retains_capacity() {
        {
            let mut scratch = acquire_scratch();
            scratch.vec.extend_from_slice(&[0u8; 4096]);
        }
        let scratch = acquire_scratch();
        assert!(scratch.vec.is_empty());
        assert!(scratch.vec.capacity() >= 4096);
    }

    #[test]
    fn writer_backing_receives_content_on_finish() {
        let mut sink: Vec<u8> = Vec::new();
        {
            let mut writer = BytesWriter::new_writer(&mut sink);
            writer.push_bytes(b"hello");
            assert_eq!(writer.into_write_finish().unwrap(), 5);
        }
        assert_eq!(sink, b"hello");
    }
}
