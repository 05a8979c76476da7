use crate::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
struct Scope {
    store: HashMap<String, Object>,
    outer: Option<Environment>,
}

/// A shared handle to one frame of the scope chain.
///
/// Cloning the handle shares the frame: closures keep their defining frame alive for
/// as long as they are reachable, and bindings made through any handle are visible
/// through all of them.
#[derive(Clone, Default)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn enclosed(outer: &Environment) -> Self {
        Self(Rc::new(RefCell::new(Scope {
            store: HashMap::new(),
            outer: Some(outer.clone()),
        })))
    }

    /// Looks `name` up in this frame, then in each enclosing frame in turn.
    pub fn get(&self, name: &str) -> Option<Object> {
        let mut env = self.clone();
        loop {
            let outer = {
                let scope = env.0.borrow();
                if let Some(obj) = scope.store.get(name) {
                    return Some(obj.clone());
                }
                scope.outer.clone()?
            };
            env = outer;
        }
    }

    /// Binds `name` in this frame only; outer bindings of the same name are shadowed,
    /// never overwritten.
    pub fn set(&self, name: &str, val: Object) -> Object {
        self.0
            .borrow_mut()
            .store
            .insert(name.to_owned(), val.clone());
        val
    }
}

// Only names are printed: a frame usually holds functions that close over it.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let scope = self.0.borrow();
        let mut names: Vec<&String> = scope.store.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("outer", &scope.outer)
            .finish()
    }
}
