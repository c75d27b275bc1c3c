//! Arena owning every runtime object of an evaluation session.
//!
//! Objects are keyed by a monotonically increasing [`ObjectId`]. Each active
//! call frame owns the ids allocated while it was the innermost frame; when
//! the frame ends, everything it owns that is not reachable from the given
//! roots is destroyed and the rest moves to the caller's frame.
//!
//! Objects are immutable, so nothing allocated before a frame opened can refer
//! to an object the frame owns. Reachability therefore never looks below the
//! frame's first id.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::object::{EvaluationError, Function, Object, ObjectId, Payload};

#[derive(Debug, Default)]
struct Frame {
    /// First id allocated after the frame was pushed.
    floor: u64,
    owned: Vec<ObjectId>,
}

#[derive(Debug)]
pub struct Heap {
    objects: FxHashMap<ObjectId, Object>,
    next_id: u64,
    /// `frames[0]` is the whole-program frame and is never popped.
    frames: Vec<Frame>,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            objects: FxHashMap::default(),
            next_id: 0,
            frames: vec![Frame::default()],
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn get(&self, id: ObjectId) -> Result<&Object, EvaluationError> {
        self.objects
            .get(&id)
            .ok_or(EvaluationError::DestroyedObject(id))
    }

    pub fn display(&self, id: ObjectId) -> Result<&str, EvaluationError> {
        self.get(id).map(Object::display)
    }

    pub fn type_name(&self, id: ObjectId) -> Result<&'static str, EvaluationError> {
        self.get(id).map(Object::type_name)
    }

    fn allocate(&mut self, payload: Payload) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let display = self.render(&payload);
        tracing::trace!(%id, object_type = payload.object_type().name(), "allocate");
        self.objects.insert(id, Object { payload, display });
        if let Some(frame) = self.frames.last_mut() {
            frame.owned.push(id);
        }
        id
    }

    fn render(&self, payload: &Payload) -> Rc<str> {
        match payload {
            Payload::Null => "null".into(),
            Payload::Int(value) => value.to_string().into(),
            Payload::Float(value) => format!("{:.6}", value).into(),
            Payload::Str(value) => value.clone(),
            Payload::List(items) => {
                let mut s = "[".to_owned();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        s.push_str(", ");
                    }
                    match self.objects.get(item) {
                        Some(Object {
                            payload: Payload::Str(value),
                            ..
                        }) => {
                            s.push('"');
                            s.push_str(value);
                            s.push('"');
                        }
                        Some(object) => s.push_str(&object.display),
                        None => s.push_str("<destroyed>"),
                    }
                }
                s.push(']');
                s.into()
            }
            Payload::Function(Function::Builtin(builtin)) => {
                format!("<builtin function {}>", builtin.name).into()
            }
            Payload::Function(Function::User(user)) => format!("<function {}>", user.name).into(),
        }
    }

    pub fn null(&mut self) -> ObjectId {
        self.allocate(Payload::Null)
    }

    pub fn int(&mut self, value: i64) -> ObjectId {
        self.allocate(Payload::Int(value))
    }

    pub fn float(&mut self, value: f64) -> ObjectId {
        self.allocate(Payload::Float(value))
    }

    pub fn str(&mut self, value: impl Into<Rc<str>>) -> ObjectId {
        self.allocate(Payload::Str(value.into()))
    }

    pub fn list(&mut self, items: Vec<ObjectId>) -> ObjectId {
        self.allocate(Payload::List(items))
    }

    pub fn function(&mut self, function: Function) -> ObjectId {
        self.allocate(Payload::Function(function))
    }

    /// Starts a call frame; later allocations belong to it.
    pub fn push_frame(&mut self) {
        self.frames.push(Frame {
            floor: self.next_id,
            owned: Vec::new(),
        });
    }

    /// Ends the innermost call frame. Objects it owns that are reachable from
    /// `roots` (through list items) are handed to the caller's frame, the
    /// rest are destroyed. Returns how many objects were destroyed.
    pub fn pop_frame(&mut self, roots: impl IntoIterator<Item = ObjectId>) -> usize {
        if self.frames.len() < 2 {
            return 0;
        }
        let Some(frame) = self.frames.pop() else {
            return 0;
        };

        let (survivors, destroyed) = self.sweep(frame, roots);
        tracing::debug!(
            destroyed,
            escaped = survivors.len(),
            depth = self.frames.len(),
            "frame torn down"
        );
        if let Some(caller) = self.frames.last_mut() {
            caller.owned.extend(survivors);
        }
        destroyed
    }

    /// Destroys what the innermost frame owns that is unreachable from
    /// `roots`, keeping the frame open. Returns how many objects were
    /// destroyed.
    pub fn collect_frame(&mut self, roots: impl IntoIterator<Item = ObjectId>) -> usize {
        let Some(frame) = self.frames.pop() else {
            return 0;
        };
        let floor = frame.floor;
        let (survivors, destroyed) = self.sweep(frame, roots);
        self.frames.push(Frame {
            floor,
            owned: survivors,
        });
        destroyed
    }

    fn sweep(
        &mut self,
        frame: Frame,
        roots: impl IntoIterator<Item = ObjectId>,
    ) -> (Vec<ObjectId>, usize) {
        let reachable = self.reachable(frame.floor, roots);
        let mut destroyed = 0;
        let mut survivors = Vec::new();
        for id in frame.owned {
            if reachable.contains(&id) {
                survivors.push(id);
            } else if self.objects.remove(&id).is_some() {
                destroyed += 1;
            }
        }
        (survivors, destroyed)
    }

    /// Ids at or above `floor` reachable from `roots`.
    fn reachable(
        &self,
        floor: u64,
        roots: impl IntoIterator<Item = ObjectId>,
    ) -> FxHashSet<ObjectId> {
        let mut reachable = FxHashSet::default();
        let mut pending: Vec<ObjectId> = roots.into_iter().filter(|id| id.0 >= floor).collect();
        while let Some(id) = pending.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(Object {
                payload: Payload::List(items),
                ..
            }) = self.objects.get(&id)
            {
                pending.extend(items.iter().copied().filter(|item| item.0 >= floor));
            }
        }
        reachable
    }

    /// Whole-program teardown: destroys every registered object. Calling it
    /// again finds an empty registry and destroys nothing.
    pub fn clear(&mut self) -> usize {
        let destroyed = self.objects.len();
        self.objects.clear();
        self.frames = vec![Frame::default()];
        tracing::debug!(destroyed, "heap cleared");
        destroyed
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
