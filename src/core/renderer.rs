//! Object renderers
//!
//! Values logged through [`Logger::log_object`](crate::core::Logger::log_object)
//! are turned into text by the renderer registered for their concrete type in
//! the owning hierarchy, or by their `Debug` implementation when none is
//! registered.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A value that can be carried by a logging event as its message.
pub trait LogObject: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> LogObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub trait ObjectRenderer: Send + Sync {
    fn render(&self, value: &dyn Any) -> String;
}

/// Renderer built from a closure over a concrete type.
pub struct FnRenderer<T, F> {
    render: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> FnRenderer<T, F>
where
    T: Any,
    F: Fn(&T) -> String + Send + Sync,
{
    pub fn new(render: F) -> Self {
        Self {
            render,
            _marker: PhantomData,
        }
    }
}

impl<T, F> ObjectRenderer for FnRenderer<T, F>
where
    T: Any,
    F: Fn(&T) -> String + Send + Sync,
{
    fn render(&self, value: &dyn Any) -> String {
        match value.downcast_ref::<T>() {
            Some(value) => (self.render)(value),
            None => String::new(),
        }
    }
}

/// Type-keyed renderer registry
#[derive(Default, Clone)]
pub struct RendererMap {
    renderers: HashMap<TypeId, Arc<dyn ObjectRenderer>>,
}

impl RendererMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, type_id: TypeId, renderer: Arc<dyn ObjectRenderer>) {
        self.renderers.insert(type_id, renderer);
    }

    pub fn put_fn<T, F>(&mut self, render: F)
    where
        T: Any,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.put(TypeId::of::<T>(), Arc::new(FnRenderer::<T, F>::new(render)));
    }

    pub fn get(&self, type_id: TypeId) -> Option<Arc<dyn ObjectRenderer>> {
        self.renderers.get(&type_id).cloned()
    }

    pub fn clear(&mut self) {
        self.renderers.clear();
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl fmt::Debug for RendererMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererMap")
            .field("renderers", &self.renderers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_fn_renderer_downcasts() {
        let mut map = RendererMap::new();
        map.put_fn(|p: &Point| format!("({}, {})", p.x, p.y));

        let renderer = map.get(TypeId::of::<Point>()).unwrap();
        assert_eq!(renderer.render(&Point { x: 1, y: 2 }), "(1, 2)");
        assert_eq!(renderer.render(&"not a point"), "");
    }

    #[test]
    fn test_log_object_exposes_concrete_type() {
        let value: Arc<dyn LogObject> = Arc::new(Point { x: 0, y: 0 });
        let object: &dyn LogObject = &*value;
        assert_eq!(Any::type_id(object.as_any()), TypeId::of::<Point>());
    }

    #[test]
    fn test_clear() {
        let mut map = RendererMap::new();
        map.put_fn(|n: &u8| n.to_string());
        assert_eq!(map.len(), 1);
        map.clear();
        assert!(map.is_empty());
    }
}
