use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::object::ObjectId;

/// One name table in the chain. Scopes bind names to objects; the heap owns
/// the objects themselves.
#[derive(Debug, Default)]
pub struct Scope {
    store: FxHashMap<Rc<str>, ObjectId>,
    outer: Option<usize>,
}

/// Chain of scopes addressed by index. Index 0 is the program scope and each
/// user-defined call pushes one scope whose parent is the caller's.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            scopes: vec![Scope::default()],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn current(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn push_enclosed(&mut self) {
        let outer = Some(self.current());
        self.scopes.push(Scope {
            store: FxHashMap::default(),
            outer,
        });
    }

    /// Drops the innermost call scope. The program scope stays.
    pub fn pop_enclosed(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    fn resolve(&self, key: &str) -> Option<usize> {
        let mut index = Some(self.current());
        while let Some(i) = index {
            let scope = &self.scopes[i];
            if scope.store.contains_key(key) {
                return Some(i);
            }
            index = scope.outer;
        }
        None
    }

    pub fn get(&self, key: &str) -> Option<ObjectId> {
        self.resolve(key)
            .and_then(|i| self.scopes[i].store.get(key).copied())
    }

    /// Binds `key` in the innermost scope.
    pub fn set(&mut self, key: Rc<str>, value: ObjectId) {
        let current = self.current();
        self.scopes[current].store.insert(key, value);
    }

    /// Rebinds the nearest existing binding of `key`. Returns `false` when the
    /// name is bound nowhere in the chain.
    pub fn assign(&mut self, key: &str, value: ObjectId) -> bool {
        match self.resolve(key) {
            Some(i) => {
                if let Some(slot) = self.scopes[i].store.get_mut(key) {
                    *slot = value;
                }
                true
            }
            None => false,
        }
    }

    /// Every object bound anywhere in the chain.
    pub fn bound_objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.scopes
            .iter()
            .flat_map(|scope| scope.store.values().copied())
    }

    pub fn clear(&mut self) {
        self.scopes = vec![Scope::default()];
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
