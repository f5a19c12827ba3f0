// minnow-vm - Mark-and-sweep heap
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The per-thread garbage-collected heap.
//!
//! Owned strings and native objects live in a slot arena addressed by
//! [`Handle`]s; freed slots go on a free list for reuse. Collection is
//! stop-the-world mark-and-sweep: the thread marks its roots through a
//! [`Marker`] (which re-enters native `protect` callbacks for transitive
//! references), then [`Heap::sweep`] finalizes and frees everything
//! unmarked and clears surviving marks.
//!
//! The collector only ever runs between VM instructions. A native `finalize`
//! callback runs exactly once per object, either during the sweep that frees
//! it or when the heap itself is dropped.

use crate::value::{NativeAddr, NativeProp, Value};

/// Collection triggers once a thread owns this many objects; afterwards the
/// threshold is twice the surviving count.
pub const INIT_GC_THRESHOLD: usize = 8;

/// Index of a heap object within its owning thread's heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u32);

#[derive(Debug)]
enum HeapKind {
    Str(String),
    Native {
        addr: NativeAddr,
        prop: Option<&'static NativeProp>,
    },
}

#[derive(Debug)]
struct HeapObject {
    marked: bool,
    kind: HeapKind,
}

/// Heap of GC-managed objects owned by one thread.
#[derive(Debug)]
pub struct Heap {
    slots: Vec<Option<HeapObject>>,
    free: Vec<u32>,
    live: usize,
    threshold: usize,
}

impl Default for Heap {
    fn default() -> Self {
        Heap::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            threshold: INIT_GC_THRESHOLD,
        }
    }

    /// Number of live objects on the heap.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Object count at which the next collection triggers.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// True when the owning thread should collect before its next cycle.
    pub fn needs_collect(&self) -> bool {
        self.live >= self.threshold
    }

    fn insert(&mut self, object: HeapObject) -> Handle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(object);
            Handle(index)
        } else {
            self.slots.push(Some(object));
            Handle((self.slots.len() - 1) as u32)
        }
    }

    /// Move an owned string onto the heap.
    pub fn alloc_string(&mut self, data: String) -> Handle {
        self.insert(HeapObject {
            marked: false,
            kind: HeapKind::Str(data),
        })
    }

    /// Track a native object. The descriptor, when given, supplies the
    /// protect/finalize/to-string behaviour for the payload.
    pub fn alloc_native(&mut self, addr: NativeAddr, prop: Option<&'static NativeProp>) -> Handle {
        self.insert(HeapObject {
            marked: false,
            kind: HeapKind::Native { addr, prop },
        })
    }

    fn object(&self, handle: Handle) -> Option<&HeapObject> {
        self.slots.get(handle.0 as usize)?.as_ref()
    }

    /// Contents of a heap string.
    pub fn string(&self, handle: Handle) -> Option<&str> {
        match self.object(handle)? {
            HeapObject {
                kind: HeapKind::Str(data),
                ..
            } => Some(data),
            _ => None,
        }
    }

    /// Payload address of a native object.
    pub fn native_addr(&self, handle: Handle) -> Option<NativeAddr> {
        match self.object(handle)? {
            HeapObject {
                kind: HeapKind::Native { addr, .. },
                ..
            } => Some(*addr),
            _ => None,
        }
    }

    /// Property descriptor of a native object, when it was created with one.
    pub fn native_prop(&self, handle: Handle) -> Option<&'static NativeProp> {
        match self.object(handle)? {
            HeapObject {
                kind: HeapKind::Native { prop, .. },
                ..
            } => *prop,
            _ => None,
        }
    }

    /// String contents of either string kind.
    pub fn value_str<'v>(&'v self, value: &'v Value) -> Option<&'v str> {
        match value {
            Value::ConstString(s) => Some(s),
            Value::String(handle) => self.string(*handle),
            _ => None,
        }
    }

    /// Equality over the value model: tags must match, except that constant
    /// and owned strings compare by contents across the two kinds. Native
    /// objects compare by payload identity.
    pub fn values_equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::ConstString(_) | Value::String(_), Value::ConstString(_) | Value::String(_)) => {
                match (self.value_str(a), self.value_str(b)) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }
            (Value::Native(x), Value::Native(y)) => {
                self.native_addr(*x) == self.native_addr(*y)
            }
            (Value::LightNative(x), Value::LightNative(y)) => x == y,
            _ => false,
        }
    }

    /// Free every unmarked object (running native finalizers), clear marks
    /// on survivors, and set the next collection threshold to twice the
    /// surviving count.
    pub fn sweep(&mut self) {
        for index in 0..self.slots.len() {
            let survives = match &mut self.slots[index] {
                Some(object) if object.marked => {
                    object.marked = false;
                    true
                }
                Some(_) => false,
                None => true,
            };

            if !survives {
                if let Some(object) = self.slots[index].take() {
                    if let HeapKind::Native { addr, prop } = &object.kind {
                        if let Some(finalize) = prop.and_then(|p| p.finalize) {
                            finalize(*addr);
                        }
                    }
                    self.free.push(index as u32);
                    self.live -= 1;
                }
            }
        }
        self.threshold = self.live * 2;
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        // Tearing down a thread finalizes everything still on its heap.
        for slot in &self.slots {
            if let Some(HeapObject {
                kind: HeapKind::Native { addr, prop },
                ..
            }) = slot
            {
                if let Some(finalize) = prop.and_then(|p| p.finalize) {
                    finalize(*addr);
                }
            }
        }
    }
}

/// Marks values reachable from the roots. Native `protect` callbacks
/// receive the marker to protect transitively referenced values.
pub struct Marker<'h> {
    heap: &'h mut Heap,
}

impl<'h> Marker<'h> {
    pub fn new(heap: &'h mut Heap) -> Self {
        Marker { heap }
    }

    /// Mark the object behind `value`, if it is heap-backed and not already
    /// marked this cycle.
    pub fn mark(&mut self, value: &Value) {
        let handle = match value {
            Value::String(handle) | Value::Native(handle) => *handle,
            _ => return,
        };

        let protect_info = {
            let Some(Some(object)) = self.heap.slots.get_mut(handle.0 as usize) else {
                return;
            };
            if object.marked {
                return;
            }
            object.marked = true;
            match &object.kind {
                HeapKind::Native { addr, prop } => {
                    (*prop).and_then(|p| p.protect).map(|f| (*addr, f))
                }
                _ => None,
            }
        };

        if let Some((addr, protect)) = protect_info {
            protect(addr, self);
        }
    }
}
