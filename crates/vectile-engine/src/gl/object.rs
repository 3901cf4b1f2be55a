//! Move-only resource handles with deferred deletion.
//!
//! Dropping a handle never calls into the graphics API. The id is appended
//! to the owning context's abandoned queue for its kind and deleted the next
//! time the context runs `perform_cleanup`, after any cached state that
//! still names it has been invalidated.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::types::{
    BufferId, FramebufferId, ProgramId, ShaderId, TextureFilter, TextureId, TextureMipMap,
    VertexArrayId,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Program,
    Shader,
    Buffer,
    Texture,
    VertexArray,
    Framebuffer,
}

/// Per-kind lists of ids waiting for deletion.
#[derive(Debug, Default)]
pub(crate) struct AbandonedQueues {
    pub programs: Vec<ProgramId>,
    pub shaders: Vec<ShaderId>,
    pub buffers: Vec<BufferId>,
    pub textures: Vec<TextureId>,
    pub vertex_arrays: Vec<VertexArrayId>,
    pub framebuffers: Vec<FramebufferId>,
}

impl AbandonedQueues {
    pub fn push(&mut self, ty: ObjectType, id: u32) {
        match ty {
            ObjectType::Program => self.programs.push(id),
            ObjectType::Shader => self.shaders.push(id),
            ObjectType::Buffer => self.buffers.push(id),
            ObjectType::Texture => self.textures.push(id),
            ObjectType::VertexArray => self.vertex_arrays.push(id),
            ObjectType::Framebuffer => self.framebuffers.push(id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
            && self.shaders.is_empty()
            && self.buffers.is_empty()
            && self.textures.is_empty()
            && self.vertex_arrays.is_empty()
            && self.framebuffers.is_empty()
    }
}

pub(crate) type SharedQueues = Rc<RefCell<AbandonedQueues>>;

/// Marker for the kind of object a [`Unique`] owns.
pub trait ObjectKind {
    const TYPE: ObjectType;
}

macro_rules! object_kind {
    ($name:ident, $ty:ident) => {
        #[derive(Debug)]
        pub enum $name {}

        impl ObjectKind for $name {
            const TYPE: ObjectType = ObjectType::$ty;
        }
    };
}

object_kind!(ProgramObject, Program);
object_kind!(ShaderObject, Shader);
object_kind!(BufferObject, Buffer);
object_kind!(TextureObject, Texture);
object_kind!(VertexArrayObject, VertexArray);
object_kind!(FramebufferObject, Framebuffer);

/// Exclusive owner of one graphics-API object id.
pub struct Unique<K: ObjectKind> {
    id: u32,
    abandoned: SharedQueues,
    _kind: PhantomData<K>,
}

impl<K: ObjectKind> Unique<K> {
    pub(crate) fn new(id: u32, abandoned: SharedQueues) -> Self {
        Self { id, abandoned, _kind: PhantomData }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl<K: ObjectKind> Drop for Unique<K> {
    fn drop(&mut self) {
        self.abandoned.borrow_mut().push(K::TYPE, self.id);
    }
}

impl<K: ObjectKind> fmt::Debug for Unique<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unique<{:?}>({})", K::TYPE, self.id)
    }
}

impl<K: ObjectKind> PartialEq for Unique<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

pub type UniqueProgram = Unique<ProgramObject>;
pub type UniqueShader = Unique<ShaderObject>;
pub type UniqueBuffer = Unique<BufferObject>;
pub type UniqueTexture = Unique<TextureObject>;
pub type UniqueVertexArray = Unique<VertexArrayObject>;
pub type UniqueFramebuffer = Unique<FramebufferObject>;

/// A vertex buffer holding `vertex_count` values of `V`.
pub struct VertexBuffer<V> {
    pub vertex_count: usize,
    pub buffer: UniqueBuffer,
    _vertex: PhantomData<V>,
}

impl<V> VertexBuffer<V> {
    pub(crate) fn new(vertex_count: usize, buffer: UniqueBuffer) -> Self {
        Self { vertex_count, buffer, _vertex: PhantomData }
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.buffer.id()
    }
}

impl<V> fmt::Debug for VertexBuffer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("vertex_count", &self.vertex_count)
            .field("buffer", &self.buffer)
            .finish()
    }
}

/// A buffer of u16 indices.
#[derive(Debug)]
pub struct IndexBuffer {
    pub index_count: usize,
    pub buffer: UniqueBuffer,
}

impl IndexBuffer {
    #[inline]
    pub fn id(&self) -> BufferId {
        self.buffer.id()
    }
}

/// A texture together with the sampling state last applied to it.
#[derive(Debug)]
pub struct Texture {
    pub size: [u32; 2],
    pub texture: UniqueTexture,
    pub filter: TextureFilter,
    pub mipmap: TextureMipMap,
}

impl Texture {
    #[inline]
    pub fn id(&self) -> TextureId {
        self.texture.id()
    }
}

#[derive(Debug)]
pub struct Framebuffer {
    pub size: [u32; 2],
    pub framebuffer: UniqueFramebuffer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_a_handle_queues_its_id() {
        let queues = SharedQueues::default();
        let program = UniqueProgram::new(7, queues.clone());
        let texture = UniqueTexture::new(3, queues.clone());
        assert!(queues.borrow().is_empty());

        drop(program);
        drop(texture);

        let q = queues.borrow();
        assert_eq!(q.programs, vec![7]);
        assert_eq!(q.textures, vec![3]);
        assert!(q.buffers.is_empty());
    }
}
