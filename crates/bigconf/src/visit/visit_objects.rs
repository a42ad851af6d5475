use super::VisitMut;
use crate::node::{Node, Object};

/// Recursively visit all [Object]s mutably
///
/// Parents are visited before their children. Entries added by the visitor are visited as well.
pub trait VisitObjectsMut {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>);
}

impl VisitObjectsMut for Object {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>) {
        visitor.visit_mut(self);
        for value in self.entries.values_mut() {
            value.visit_objects_mut(visitor);
        }
    }
}

impl VisitObjectsMut for Node {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>) {
        match self {
            Node::Object(object) => object.visit_objects_mut(visitor),
            Node::Text(_) | Node::List(_) => {}
        }
    }
}
