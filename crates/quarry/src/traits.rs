use crate::{
    schema::{EntityDeclaration, SchemaError},
    value::Value,
};
use std::any::Any;

///
/// Record
///
/// Object-safe access to an entity's mapped fields and relations. The
/// persistence core walks entity graphs through this trait: cascades read
/// and stamp fields by name, the rehydrator materializes children through
/// `attach`, and generated keys are written back through `set`.
///
/// Field and relation names are the declared names, not column names.
/// `get` returns `None` for unmapped names; `set` and `attach` report
/// shape mismatches as `SchemaError`.
///

pub trait Record: Any + Send {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Current value of a mapped field, `None` for unknown names.
    fn get(&self, field: &str) -> Option<Value>;

    /// Write a mapped field. Implementations accept `Value::Null` for
    /// optional fields and reject values of the wrong shape.
    fn set(&mut self, field: &str, value: Value) -> Result<(), SchemaError>;

    /// The referenced object of a ToOne relation, if present.
    fn to_one(&self, relation: &str) -> Option<&dyn Record>;

    fn to_one_mut(&mut self, relation: &str) -> Option<&mut dyn Record>;

    /// The children of a ToMany relation, empty for unknown names.
    fn to_many(&self, relation: &str) -> Vec<&dyn Record>;

    fn to_many_mut(&mut self, relation: &str) -> Vec<&mut dyn Record>;

    /// Attach a rehydrated child: ToOne relations take ownership of the
    /// target, ToMany relations append. The child must downcast to the
    /// relation's declared target type.
    fn attach(&mut self, relation: &str, child: Box<dyn Record>) -> Result<(), SchemaError>;
}

///
/// Entity
///
/// A typed root that can be stored and loaded. `declaration()` is the
/// source of truth the registry builds the cached `EntitySchema` from;
/// `Default` provides the blank instance rehydration starts with.
///

pub trait Entity: Record + Default + Sized + 'static {
    fn declaration() -> EntityDeclaration;
}
