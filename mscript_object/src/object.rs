//! Configured objects as typed property bags.

use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;
use mscript_data_type::{DimensionError, ParameterType, Rmatrix, Value};
use serde::{Deserialize, Serialize};

use crate::{ObjectError, SystemParameter};

/// A shared handle to an object.
///
/// Objects are owned by an [ObjectStore](crate::ObjectStore). Wrappers and Parameters hold
/// additional handles so that renaming or mutating an object is visible through all of them.
pub type ObjectRef = Rc<RefCell<Object>>;

/// The category of an object, used for reference type checks.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Spacecraft,
    Burn,
    Parameter,
    SolarSystem,
    CelestialBody,
    CalculatedPoint,
    ForceModel,
    PhysicalModel,
    PropSetup,
    Propagator,
    CoordinateSystem,
    AxisSystem,
    Subscriber,
    /// Any object with a position: spacecraft, bodies and calculated points.
    SpacePoint,
    Unknown,
}

impl ObjectType {
    /// The name used for this type in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ObjectType::Spacecraft => "Spacecraft",
            ObjectType::Burn => "Burn",
            ObjectType::Parameter => "Parameter",
            ObjectType::SolarSystem => "SolarSystem",
            ObjectType::CelestialBody => "CelestialBody",
            ObjectType::CalculatedPoint => "CalculatedPoint",
            ObjectType::ForceModel => "ForceModel",
            ObjectType::PhysicalModel => "PhysicalModel",
            ObjectType::PropSetup => "PropSetup",
            ObjectType::Propagator => "Propagator",
            ObjectType::CoordinateSystem => "CoordinateSystem",
            ObjectType::AxisSystem => "AxisSystem",
            ObjectType::Subscriber => "Subscriber",
            ObjectType::SpacePoint => "SpacePoint",
            ObjectType::Unknown => "UnknownObject",
        }
    }

    /// Return true if an object of type `self` can be used where `other` is expected.
    pub fn is_a(self, other: ObjectType) -> bool {
        self == other
            || (other == ObjectType::SpacePoint
                && matches!(
                    self,
                    ObjectType::Spacecraft | ObjectType::CelestialBody | ObjectType::CalculatedPoint
                ))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A named, typed field on an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// The field name used in scripts.
    pub name: String,
    /// The type of the stored value.
    pub data_type: ParameterType,
    /// The current value.
    pub value: Value,
    /// Read-only fields reject writes.
    pub read_only: bool,
    /// For object references, the type the referenced object must have.
    pub ref_type: Option<ObjectType>,
    /// For enumerations, the accepted values.
    pub accepted: Vec<String>,
}

impl Property {
    fn new(name: &str, data_type: ParameterType, value: Value) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            value,
            read_only: false,
            ref_type: None,
            accepted: Vec::new(),
        }
    }

    /// A real-valued field.
    pub fn real(name: &str, value: f64) -> Self {
        Self::new(name, ParameterType::Real, Value::Real(value))
    }

    /// An integer field.
    pub fn integer(name: &str, value: i64) -> Self {
        Self::new(name, ParameterType::Integer, Value::Integer(value))
    }

    /// A free text field.
    pub fn string(name: &str, value: &str) -> Self {
        Self::new(name, ParameterType::String, Value::from(value))
    }

    /// A file path field.
    pub fn filename(name: &str, value: &str) -> Self {
        Self::new(name, ParameterType::Filename, Value::from(value))
    }

    /// A boolean field.
    pub fn boolean(name: &str, value: bool) -> Self {
        Self::new(name, ParameterType::Boolean, Value::Boolean(value))
    }

    /// An on/off field.
    pub fn on_off(name: &str, value: bool) -> Self {
        Self::new(name, ParameterType::OnOff, Value::OnOff(value))
    }

    /// A list of names, e.g. `{Earth, Luna}`.
    pub fn string_array(name: &str, values: &[&str]) -> Self {
        Self::new(
            name,
            ParameterType::StringArray,
            Value::StringArray(values.iter().map(|s| s.to_string()).collect()),
        )
    }

    /// A field restricted to one of `accepted`.
    pub fn enumeration(name: &str, value: &str, accepted: &[&str]) -> Self {
        let mut property = Self::new(name, ParameterType::Enumeration, Value::from(value));
        property.accepted = accepted.iter().map(|s| s.to_string()).collect();
        property
    }

    /// A reference to another object by name.
    pub fn reference(name: &str, ref_type: ObjectType, value: &str) -> Self {
        let mut property = Self::new(name, ParameterType::Object, Value::Object(value.into()));
        property.ref_type = Some(ref_type);
        property
    }

    /// Mark the field read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Kind-specific state, beyond the property table.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    /// An object described entirely by its properties.
    Plain,
    /// A user Variable holding a real.
    Variable(f64),
    /// A user Array.
    Array(ArrayData),
    /// A user String.
    String(String),
    /// A system Parameter computed from an owner object.
    Parameter(SystemParameter),
}

/// The storage of an Array, sized once.
#[derive(Debug, Clone, Default)]
pub struct ArrayData {
    values: Option<Rmatrix>,
}

impl ArrayData {
    /// The `(rows, cols)` size, if set.
    pub fn size(&self) -> Option<(usize, usize)> {
        self.values.as_ref().map(Rmatrix::dims)
    }

    /// The values, if the size has been set.
    pub fn values(&self) -> Option<&Rmatrix> {
        self.values.as_ref()
    }
}

/// A configured object.
#[derive(Debug)]
pub struct Object {
    name: String,
    type_name: String,
    object_type: ObjectType,
    properties: IndexMap<String, Property>,
    owned: Vec<ObjectRef>,
    kind: ObjectKind,
}

/// Cloning is a deep copy: owned sub-objects are duplicated, not shared.
impl Clone for Object {
    fn clone(&self) -> Self {
        self.duplicate()
    }
}

impl Object {
    /// Create an object with no properties.
    pub fn new(name: &str, type_name: &str, object_type: ObjectType) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            object_type,
            properties: IndexMap::new(),
            owned: Vec::new(),
            kind: ObjectKind::Plain,
        }
    }

    /// Add a property.
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Add an owned sub-object.
    pub fn with_owned(mut self, object: Object) -> Self {
        self.owned.push(object.into_ref());
        self
    }

    pub(crate) fn with_kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    /// Wrap the object in a shared handle.
    pub fn into_ref(self) -> ObjectRef {
        Rc::new(RefCell::new(self))
    }

    /// The object's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// The script type name, e.g. `Spacecraft` or `ImpulsiveBurn`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The object category.
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Return true if the object can be used where `object_type` is expected.
    pub fn is_of_type(&self, object_type: ObjectType) -> bool {
        self.object_type.is_a(object_type)
    }

    /// The kind-specific state.
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut ObjectKind {
        &mut self.kind
    }

    /// Return true for Variables, Arrays, Strings and system Parameters.
    pub fn is_parameter(&self) -> bool {
        self.object_type == ObjectType::Parameter
    }

    /// Return true for user Variables.
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, ObjectKind::Variable(_))
    }

    /// Return true for user Arrays.
    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array(_))
    }

    /// Return true for user Strings and string-valued system Parameters.
    pub fn is_string_object(&self) -> bool {
        match &self.kind {
            ObjectKind::String(_) => true,
            ObjectKind::Parameter(param) => param.return_type() == ParameterType::String,
            _ => false,
        }
    }

    /// The property table in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Look up the id of a property by name.
    pub fn parameter_id(&self, name: &str) -> Result<usize, ObjectError> {
        self.properties
            .get_index_of(name)
            .ok_or_else(|| ObjectError::UndefinedProperty {
                object: self.name.clone(),
                property: name.to_string(),
            })
    }

    /// Look up a property by id.
    pub fn property(&self, id: usize) -> Result<&Property, ObjectError> {
        self.properties
            .get_index(id)
            .map(|(_, property)| property)
            .ok_or_else(|| ObjectError::UndefinedProperty {
                object: self.name.clone(),
                property: format!("#{}", id),
            })
    }

    /// Read a property by id.
    pub fn get_value(&self, id: usize) -> Result<Value, ObjectError> {
        Ok(self.property(id)?.value.clone())
    }

    /// Read a property by name.
    pub fn get(&self, name: &str) -> Result<Value, ObjectError> {
        self.get_value(self.parameter_id(name)?)
    }

    /// Read a real-valued property by name.
    pub fn get_real(&self, name: &str) -> Result<f64, ObjectError> {
        Ok(self.get(name)?.try_as_real()?)
    }

    /// Write a property by id, converting the value to the property's type.
    pub fn set_value(&mut self, id: usize, value: Value) -> Result<(), ObjectError> {
        let object_name = self.name.clone();
        let property = self
            .properties
            .get_index_mut(id)
            .map(|(_, property)| property)
            .ok_or_else(|| ObjectError::UndefinedProperty {
                object: object_name.clone(),
                property: format!("#{}", id),
            })?;
        if property.read_only {
            return Err(ObjectError::ReadOnlyProperty {
                object: object_name,
                property: property.name.clone(),
            });
        }
        property.value = coerce(&object_name, property, value)?;
        Ok(())
    }

    /// Write a property by name.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ObjectError> {
        let id = self.parameter_id(name)?;
        self.set_value(id, value.into())
    }

    /// The owned sub-objects, e.g. a force model's physical models.
    pub fn owned(&self) -> &[ObjectRef] {
        &self.owned
    }

    /// Replace the owned sub-objects of the given type.
    pub fn replace_owned(&mut self, object_type: ObjectType, object: Object) {
        self.owned.retain(|o| o.borrow().object_type() != object_type);
        self.owned.push(object.into_ref());
    }

    /// Find an owned sub-object by name.
    pub fn find_owned(&self, name: &str) -> Option<ObjectRef> {
        self.owned
            .iter()
            .find(|o| o.borrow().name() == name)
            .cloned()
    }

    /// Find the first owned sub-object that has `property`.
    ///
    /// If `owned_name` is non-empty, only the sub-object with that name is searched.
    pub fn find_owned_property(
        &self,
        owned_name: &str,
        property: &str,
    ) -> Option<(ObjectRef, usize)> {
        self.owned.iter().find_map(|owned| {
            let candidate = owned.borrow();
            if !owned_name.is_empty() && candidate.name() != owned_name {
                return None;
            }
            candidate
                .parameter_id(property)
                .ok()
                .map(|id| (Rc::clone(owned), id))
        })
    }

    /// The names of objects of `object_type` that this object references.
    pub fn ref_object_names(&self, object_type: ObjectType) -> Vec<String> {
        self.ref_objects()
            .into_iter()
            .filter(|(t, _)| *t == object_type)
            .map(|(_, name)| name)
            .collect()
    }

    /// Every `(type, name)` reference held in a reference-typed property.
    pub fn ref_objects(&self) -> Vec<(ObjectType, String)> {
        self.properties
            .values()
            .filter_map(|p| match (&p.ref_type, &p.value) {
                (Some(t), Value::Object(name)) if !name.is_empty() => Some((*t, name.clone())),
                _ => None,
            })
            .collect()
    }

    /// Update reference-typed properties that name `old`.
    pub fn rename_references(&mut self, old: &str, new: &str) {
        for property in self.properties.values_mut() {
            match &mut property.value {
                Value::Object(name) if name == old => *name = new.to_string(),
                Value::StringArray(names) => {
                    for name in names.iter_mut().filter(|n| *n == old) {
                        *name = new.to_string();
                    }
                }
                _ => {}
            }
        }
        if let ObjectKind::Parameter(param) = &mut self.kind {
            param.rename_references(old, new);
        }
    }

    /// A deep copy, including owned sub-objects.
    pub fn duplicate(&self) -> Object {
        Object {
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            object_type: self.object_type,
            properties: self.properties.clone(),
            owned: self
                .owned
                .iter()
                .map(|o| o.borrow().duplicate().into_ref())
                .collect(),
            kind: self.kind.clone(),
        }
    }

    /// Copy the state of `other` into this object, keeping this object's name.
    pub fn copy_from(&mut self, other: &Object) {
        let name = std::mem::take(&mut self.name);
        *self = other.duplicate();
        self.name = name;
    }

    /// The data type produced when this Parameter object is evaluated.
    pub fn return_type(&self) -> ParameterType {
        match &self.kind {
            ObjectKind::Plain => ParameterType::Object,
            ObjectKind::Variable(_) => ParameterType::Real,
            ObjectKind::Array(_) => ParameterType::Matrix,
            ObjectKind::String(_) => ParameterType::String,
            ObjectKind::Parameter(param) => param.return_type(),
        }
    }

    /// Evaluate a Parameter object.
    pub fn evaluate(&self) -> Result<Value, ObjectError> {
        match &self.kind {
            ObjectKind::Plain => Err(ObjectError::NotAParameter(self.name.clone())),
            ObjectKind::Variable(value) => Ok(Value::Real(*value)),
            ObjectKind::Array(data) => data
                .values()
                .cloned()
                .map(Value::Matrix)
                .ok_or_else(|| ObjectError::ArraySizeNotSet(self.name.clone())),
            ObjectKind::String(value) => Ok(Value::String(value.clone())),
            ObjectKind::Parameter(param) => param.evaluate(&self.name),
        }
    }

    /// Assign a value to a Parameter object.
    pub fn assign(&mut self, value: Value) -> Result<(), ObjectError> {
        let name = self.name.clone();
        match &mut self.kind {
            ObjectKind::Plain => Err(ObjectError::NotAParameter(name)),
            ObjectKind::Variable(stored) => {
                *stored = value.try_as_real()?;
                Ok(())
            }
            ObjectKind::Array(data) => {
                let matrix = value.try_as_matrix()?;
                let values = data
                    .values
                    .as_mut()
                    .ok_or(ObjectError::ArraySizeNotSet(name))?;
                if values.dims() != matrix.dims() {
                    return Err(ObjectError::DimensionError(DimensionError {
                        operation: "assignment",
                        left: values.dims(),
                        right: matrix.dims(),
                    }));
                }
                *values = matrix.clone();
                Ok(())
            }
            ObjectKind::String(stored) => {
                *stored = value.try_as_str()?.to_string();
                Ok(())
            }
            ObjectKind::Parameter(param) => param.assign(&name, &value),
        }
    }

    /// Set the size of an Array. The size can only be set once.
    pub fn set_array_size(&mut self, rows: usize, cols: usize) -> Result<(), ObjectError> {
        let name = self.name.clone();
        match &mut self.kind {
            ObjectKind::Array(data) => {
                if data.values.is_some() {
                    return Err(ObjectError::ArraySizeAlreadySet(name));
                }
                if rows == 0 || cols == 0 {
                    return Err(ObjectError::InvalidArraySize {
                        array: name,
                        rows,
                        cols,
                    });
                }
                data.values = Some(Rmatrix::new(rows, cols));
                Ok(())
            }
            _ => Err(ObjectError::NotAParameter(name)),
        }
    }

    /// Read an Array element using 0-based indices.
    pub fn array_element(&self, row: usize, col: usize) -> Result<f64, ObjectError> {
        let values = self.array_values()?;
        values
            .get(row, col)
            .ok_or_else(|| self.index_error(values, row, col))
    }

    /// Write an Array element using 0-based indices.
    pub fn set_array_element(
        &mut self,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<(), ObjectError> {
        let error = {
            let values = self.array_values()?;
            self.index_error(values, row, col)
        };
        match &mut self.kind {
            ObjectKind::Array(ArrayData {
                values: Some(values),
            }) => {
                *values.get_mut(row, col).ok_or(error)? = value;
                Ok(())
            }
            _ => Err(error),
        }
    }

    /// The values of an Array.
    pub fn array_values(&self) -> Result<&Rmatrix, ObjectError> {
        match &self.kind {
            ObjectKind::Array(data) => data
                .values()
                .ok_or_else(|| ObjectError::ArraySizeNotSet(self.name.clone())),
            _ => Err(ObjectError::NotAParameter(self.name.clone())),
        }
    }

    fn index_error(&self, values: &Rmatrix, row: usize, col: usize) -> ObjectError {
        ObjectError::IndexOutOfBounds {
            array: self.name.clone(),
            row: row + 1,
            col: col + 1,
            rows: values.rows(),
            cols: values.cols(),
        }
    }
}

fn coerce(object: &str, property: &Property, value: Value) -> Result<Value, ObjectError> {
    let invalid = |accepted: String| ObjectError::InvalidPropertyValue {
        object: object.to_string(),
        property: property.name.clone(),
        value: value.clone(),
        accepted,
    };
    let coerced = match property.data_type {
        ParameterType::Real => Value::Real(value.try_as_real()?),
        ParameterType::Integer => Value::Integer(value.try_as_integer()?),
        ParameterType::UnsignedInt => match value.try_as_integer()? {
            n if n >= 0 => Value::Integer(n),
            _ => return Err(invalid("Integer >= 0".into())),
        },
        ParameterType::String | ParameterType::Filename => {
            Value::String(value.try_as_str()?.to_string())
        }
        ParameterType::Enumeration => {
            let text = value.try_as_str()?;
            if !property.accepted.is_empty() && !property.accepted.iter().any(|a| a == text) {
                return Err(invalid(property.accepted.join(", ")));
            }
            Value::String(text.to_string())
        }
        ParameterType::OnOff => Value::OnOff(
            value
                .try_as_on_off()
                .map_err(|_| invalid("On, Off".into()))?,
        ),
        ParameterType::Boolean => match &value {
            Value::Boolean(b) => Value::Boolean(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Value::Boolean(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Value::Boolean(false),
            _ => return Err(invalid("true, false".into())),
        },
        ParameterType::Object => Value::Object(value.try_as_str()?.to_string()),
        ParameterType::StringArray | ParameterType::ObjectArray => match &value {
            Value::StringArray(items) => Value::StringArray(items.clone()),
            Value::String(s) => Value::StringArray(parse_name_list(s)),
            _ => return Err(invalid("a list of names, e.g. {a, b}".into())),
        },
        ParameterType::Rvector | ParameterType::Matrix => {
            Value::Matrix(value.try_as_matrix()?.clone())
        }
        ParameterType::Unknown => value,
    };
    Ok(coerced)
}

/// Split `{a, b, c}` or `a b c` into names.
fn parse_name_list(text: &str) -> Vec<String> {
    text.trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lander() -> Object {
        Object::new("lander", "Lander", ObjectType::Spacecraft)
            .with_property(Property::real("Mass", 10.0))
            .with_property(Property::enumeration("Mode", "A", &["A", "B"]))
            .with_property(Property::on_off("Heater", false))
            .with_property(Property::string_array("Bodies", &["Earth"]))
            .with_property(Property::real("Serial", 1.0).read_only())
    }

    #[test]
    fn test_set_coerces_values() {
        let mut object = lander();
        object.set("Mass", 12_i64).unwrap();
        assert_eq!(object.get("Mass").unwrap(), Value::Real(12.0));
        object.set("Heater", "On").unwrap();
        assert_eq!(object.get("Heater").unwrap(), Value::OnOff(true));
        object.set("Bodies", "{Earth, Luna}").unwrap();
        assert_eq!(
            object.get("Bodies").unwrap(),
            Value::StringArray(vec!["Earth".into(), "Luna".into()])
        );
    }

    #[test]
    fn test_invalid_enumeration_lists_accepted_values() {
        let mut object = lander();
        let error = object.set("Mode", "C").unwrap_err();
        assert!(error.to_string().contains("The allowed values are: [A, B]"));
    }

    #[test]
    fn test_read_only() {
        let mut object = lander();
        assert!(matches!(
            object.set("Serial", 2.0),
            Err(ObjectError::ReadOnlyProperty { .. })
        ));
        assert!(object.parameter_id("Nope").is_err());
    }

    #[test]
    fn test_clone_is_deep() {
        let original = lander().with_owned(Object::variable("fuel", 1.0));
        let mut copy = original.clone();
        copy.set("Mass", 20.0).unwrap();
        copy.owned()[0].borrow_mut().assign(Value::Real(5.0)).unwrap();

        assert_eq!(original.get_real("Mass").unwrap(), 10.0);
        assert_eq!(original.owned()[0].borrow().evaluate().unwrap(), Value::Real(1.0));
        assert!(!Rc::ptr_eq(&original.owned()[0], &copy.owned()[0]));
    }

    #[test]
    fn test_space_point_hierarchy() {
        assert!(ObjectType::Spacecraft.is_a(ObjectType::SpacePoint));
        assert!(!ObjectType::Burn.is_a(ObjectType::SpacePoint));
    }
}
