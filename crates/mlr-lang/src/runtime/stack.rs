//! Local-variable storage.
//!
//! A [`Stack`] holds one [`FrameSet`] per active call, plus the global frame
//! set used by top-level blocks. A frame set is a stack of [`Frame`]s, one
//! per lexical block currently being executed.
//!
//! The global frame set itself lives for the whole record stream, but each
//! execution of a `begin`, main or `end` block pushes its own frame onto it
//! and pops it on the way out. Top-level locals therefore last for one
//! execution only and never carry over from one record to the next.
//!
//! Name resolution walks the frames of the current frame set from the
//! innermost outwards and stops there: a function body never sees its
//! caller's locals, and the caller never sees the callee's.
//!
//! There are two ways to bind a name and they differ only in where they look:
//!
//! * [`Stack::assign_or_reuse`] (`x = 1`) updates the nearest existing
//!   binding, or creates one in the innermost frame if there is none;
//! * [`Stack::declare_local`] (`var x = 1`, `int x = 1`) always creates the
//!   binding in the innermost frame, shadowing any outer one, and fails if
//!   that frame already has it.

use std::iter;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{Ident, TypeGate, Value, value::nest};

use super::binding::TypedBinding;
use super::error::ScopeError;

/// Bindings of one lexical block.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    bindings: Vec<TypedBinding>,
    offsets: FxHashMap<Ident, usize>,
}

impl Frame {
    pub fn get(&self, name: Ident) -> Option<&TypedBinding> {
        self.offsets.get(&name).map(|&i| &self.bindings[i])
    }

    fn get_mut(&mut self, name: Ident) -> Option<&mut TypedBinding> {
        self.offsets.get(&name).map(|&i| &mut self.bindings[i])
    }

    fn insert(&mut self, binding: TypedBinding) {
        let name = binding.name();
        match self.offsets.get(&name) {
            Some(&i) => self.bindings[i] = binding,
            None => {
                self.offsets.insert(name, self.bindings.len());
                self.bindings.push(binding);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypedBinding> {
        self.bindings.iter()
    }
}

/// The frames of one function activation, or of the top level.
///
/// The outermost frame is held apart from the nested ones so that a frame
/// set can never be empty.
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    base: Frame,
    nested: Vec<Frame>,
}

impl FrameSet {
    /// Frames from innermost to outermost.
    fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.nested.iter().rev().chain(iter::once(&self.base))
    }

    fn frames_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.nested
            .iter_mut()
            .rev()
            .chain(iter::once(&mut self.base))
    }

    fn innermost_mut(&mut self) -> &mut Frame {
        self.nested.last_mut().unwrap_or(&mut self.base)
    }

    fn innermost(&self) -> &Frame {
        self.nested.last().unwrap_or(&self.base)
    }

    fn find(&self, name: Ident) -> Option<&TypedBinding> {
        self.frames().find_map(|frame| frame.get(name))
    }

    fn find_mut(&mut self, name: Ident) -> Option<&mut TypedBinding> {
        self.frames_mut().find_map(|frame| frame.get_mut(name))
    }

    /// Number of frames, including the base frame.
    pub fn depth(&self) -> usize {
        self.nested.len() + 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct Stack {
    global: FrameSet,
    calls: Vec<FrameSet>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    fn current(&self) -> &FrameSet {
        self.calls.last().unwrap_or(&self.global)
    }

    #[inline(always)]
    fn current_mut(&mut self) -> &mut FrameSet {
        self.calls.last_mut().unwrap_or(&mut self.global)
    }

    /// Value of the nearest binding of `name` in the current frame set.
    pub fn get(&self, name: Ident) -> Option<&Value> {
        self.current().find(name).map(TypedBinding::value)
    }

    pub fn get_binding(&self, name: Ident) -> Option<&TypedBinding> {
        self.current().find(name)
    }

    /// Plain assignment: reuse the nearest binding, else bind untyped in the
    /// innermost frame.
    pub fn assign_or_reuse(&mut self, name: Ident, value: Value) -> Result<(), ScopeError> {
        let frames = self.current_mut();
        match frames.find_mut(name) {
            Some(binding) => binding.assign(value),
            None => {
                frames
                    .innermost_mut()
                    .insert(TypedBinding::untyped(name, value));
                Ok(())
            }
        }
    }

    /// Binds in the innermost frame without looking outwards. An existing
    /// binding there is overwritten, subject to its type gate. Used for loop
    /// variables.
    pub fn bind_at_scope(&mut self, name: Ident, value: Value) -> Result<(), ScopeError> {
        let frame = self.current_mut().innermost_mut();
        match frame.get_mut(name) {
            Some(binding) => binding.assign(value),
            None => {
                frame.insert(TypedBinding::untyped(name, value));
                Ok(())
            }
        }
    }

    /// Declared assignment: always a new binding in the innermost frame.
    /// Fails if that frame already binds `name`, whatever its type.
    pub fn declare_local(
        &mut self,
        name: Ident,
        gate: TypeGate,
        value: Value,
    ) -> Result<(), ScopeError> {
        let frame = self.current_mut().innermost_mut();
        if frame.get(name).is_some() {
            return Err(ScopeError::Redeclared(name));
        }
        frame.insert(TypedBinding::new(name, value, gate)?);
        Ok(())
    }

    /// Indexed assignment, `name[i1][i2]... = value`.
    ///
    /// Reuses the nearest binding like [`Stack::assign_or_reuse`]. With no
    /// binding, the leading index must be a string or int, and a new map is
    /// bound in the innermost frame.
    pub fn assign_indexed(
        &mut self,
        name: Ident,
        indices: &[Value],
        value: Value,
    ) -> Result<(), ScopeError> {
        let frames = self.current_mut();
        if let Some(binding) = frames.find_mut(name) {
            return binding.assign_indexed(indices, value);
        }

        match indices.first() {
            Some(Value::String(_) | Value::Void | Value::Int(_)) => {
                let fresh = nest(indices, value)
                    .map_err(|source| ScopeError::Index { name, source })?;
                frames
                    .innermost_mut()
                    .insert(TypedBinding::untyped(name, fresh));
                Ok(())
            }
            Some(other) => Err(ScopeError::LeadingIndexType {
                name,
                got: other.type_name(),
            }),
            None => Err(ScopeError::LeadingIndexType { name, got: "absent" }),
        }
    }

    /// Clears the nearest binding to absent. Unbound names are ignored.
    pub fn unset(&mut self, name: Ident) {
        if let Some(binding) = self.current_mut().find_mut(name) {
            binding.unassign();
        }
    }

    /// Removes one element from the nearest binding's value. Unbound names
    /// are ignored.
    pub fn unset_indexed(&mut self, name: Ident, indices: &[Value]) -> Result<(), ScopeError> {
        match self.current_mut().find_mut(name) {
            Some(binding) => binding.unassign_indexed(indices),
            None => Ok(()),
        }
    }

    /// Enters a block.
    pub fn push_frame(&mut self) {
        let frames = self.current_mut();
        frames.nested.push(Frame::default());
        trace!(depth = frames.depth(), "push frame");
    }

    /// Leaves a block. The base frame of a frame set is never popped.
    pub fn pop_frame(&mut self) {
        let frames = self.current_mut();
        frames.nested.pop();
        trace!(depth = frames.depth(), "pop frame");
    }

    /// Enters a function call with a fresh, empty frame set.
    pub fn push_frame_set(&mut self) {
        self.calls.push(FrameSet::default());
        trace!(call_depth = self.calls.len(), "push frame set");
    }

    /// Leaves a function call. The global frame set is never popped.
    pub fn pop_frame_set(&mut self) {
        self.calls.pop();
        trace!(call_depth = self.calls.len(), "pop frame set");
    }

    /// Number of active function calls.
    pub fn call_depth(&self) -> usize {
        self.calls.len()
    }

    /// Number of frames in the current frame set.
    pub fn frame_depth(&self) -> usize {
        self.current().depth()
    }

    /// Bindings of the innermost frame of the current frame set.
    pub fn innermost_frame(&self) -> &Frame {
        self.current().innermost()
    }
}
