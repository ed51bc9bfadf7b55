use std::{fmt, rc::Rc};

use mscript_data_type::{ParameterType, Rmatrix, Value};
use mscript_object::{replace_name, ObjectRef};

use crate::WrapperError;

/// The kind of an [ElementWrapper], without its binding.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapperType {
    Number,
    String,
    Boolean,
    OnOff,
    ObjectProperty,
    Parameter,
    Variable,
    Array,
    ArrayElement,
    Object,
    StringObject,
}

impl WrapperType {
    /// The name used for this kind in error messages.
    pub fn name(self) -> &'static str {
        match self {
            WrapperType::Number => "Number",
            WrapperType::String => "String",
            WrapperType::Boolean => "Boolean",
            WrapperType::OnOff => "OnOff",
            WrapperType::ObjectProperty => "ObjectProperty",
            WrapperType::Parameter => "Parameter",
            WrapperType::Variable => "Variable",
            WrapperType::Array => "Array",
            WrapperType::ArrayElement => "ArrayElement",
            WrapperType::Object => "Object",
            WrapperType::StringObject => "StringObject",
        }
    }

    /// Return true for literal kinds, which are never bound to an object.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            WrapperType::Number | WrapperType::String | WrapperType::Boolean | WrapperType::OnOff
        )
    }
}

impl fmt::Display for WrapperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The backing of an [ElementWrapper].
///
/// Object-backed kinds hold `None` until they are bound.
#[derive(Debug, Clone)]
pub enum WrapperKind {
    /// A real literal.
    Number(f64),
    /// A string literal, stored without its quotes.
    String(String),
    /// A `true`/`false` literal.
    Boolean(bool),
    /// An `On`/`Off` literal.
    OnOff(bool),
    /// A field on an object or on one of its owned sub-objects.
    ObjectProperty(PropertyRef),
    /// A system Parameter.
    Parameter(Option<ObjectRef>),
    /// A user Variable.
    Variable(Option<ObjectRef>),
    /// A whole user Array.
    Array(Option<ObjectRef>),
    /// A single Array element.
    ArrayElement(ArrayElementRef),
    /// A whole configured object.
    Object(Option<ObjectRef>),
    /// A user String or string-valued Parameter.
    StringObject(Option<ObjectRef>),
}

/// The binding of an object property wrapper.
#[derive(Debug, Clone)]
pub struct PropertyRef {
    owner: String,
    owned: String,
    property: String,
    target: Option<(ObjectRef, usize)>,
}

impl PropertyRef {
    /// An unbound reference to `owner.property`, or to `property` on the sub-object `owned` of
    /// `owner` if `owned` is non-empty.
    pub fn new(owner: &str, owned: &str, property: &str) -> Self {
        Self {
            owner: owner.to_string(),
            owned: owned.to_string(),
            property: property.to_string(),
            target: None,
        }
    }

    /// The name of the object the property is reached from.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The property name.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Bind to the owner object. Returns false if the property cannot be found on it.
    ///
    /// With no sub-object name the owner's own fields are searched first, then the fields of
    /// every owned sub-object in order.
    pub fn bind(&mut self, owner: &ObjectRef) -> bool {
        self.target = find_property(owner, &self.owned, &self.property);
        self.target.is_some()
    }

    /// The object that holds the property, and the property id.
    pub fn target(&self) -> Option<(&ObjectRef, usize)> {
        self.target.as_ref().map(|(object, id)| (object, *id))
    }
}

/// Find `property` on `owner`, or on the owned sub-object named `owned`.
pub fn find_property(owner: &ObjectRef, owned: &str, property: &str) -> Option<(ObjectRef, usize)> {
    let owner_ref = owner.borrow();
    if owned.is_empty() {
        if let Ok(id) = owner_ref.parameter_id(property) {
            return Some((Rc::clone(owner), id));
        }
    }
    owner_ref.find_owned_property(owned, property)
}

/// The binding of an array element wrapper.
#[derive(Debug, Clone)]
pub struct ArrayElementRef {
    name: String,
    array: Option<ObjectRef>,
    row: Box<ElementWrapper>,
    column: Box<ElementWrapper>,
}

impl ArrayElementRef {
    /// An unbound reference to `name(row, column)`.
    pub fn new(name: &str, row: ElementWrapper, column: ElementWrapper) -> Self {
        Self {
            name: name.to_string(),
            array: None,
            row: Box::new(row),
            column: Box::new(column),
        }
    }

    /// The array name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The row index wrapper.
    pub fn row(&self) -> &ElementWrapper {
        &self.row
    }

    /// The column index wrapper.
    pub fn column(&self) -> &ElementWrapper {
        &self.column
    }

    /// The bound array.
    pub fn array(&self) -> Option<&ObjectRef> {
        self.array.as_ref()
    }

    fn indices(&self) -> Result<(usize, usize), WrapperError> {
        Ok((index(&self.row)?, index(&self.column)?))
    }
}

/// Evaluate a 1-based index wrapper to a 0-based index.
fn index(wrapper: &ElementWrapper) -> Result<usize, WrapperError> {
    let value = wrapper.evaluate_real()?;
    if value.fract() != 0.0 || value < 1.0 {
        return Err(WrapperError::InvalidIndex {
            description: wrapper.description().to_string(),
            value,
        });
    }
    Ok(value as usize - 1)
}

/// Typed evaluation and assignment through a wrapper.
///
/// Every operation fails with [WrapperError::InvalidOperation] when the wrapper kind does not
/// support it, and with [WrapperError::NotBound] when the wrapper has not been bound.
pub trait ElementAccess {
    /// The type of the value behind the wrapper.
    fn data_type(&self) -> ParameterType;

    /// Read the value as a real.
    fn evaluate_real(&self) -> Result<f64, WrapperError>;
    /// Read the value as an integer.
    fn evaluate_integer(&self) -> Result<i64, WrapperError>;
    /// Read the value as text.
    fn evaluate_string(&self) -> Result<String, WrapperError>;
    /// Read the value as a boolean.
    fn evaluate_boolean(&self) -> Result<bool, WrapperError>;
    /// Read the value as an on/off flag.
    fn evaluate_on_off(&self) -> Result<bool, WrapperError>;
    /// Read the value as a matrix.
    fn evaluate_matrix(&self) -> Result<Rmatrix, WrapperError>;
    /// The object behind the wrapper.
    fn evaluate_object(&self) -> Result<ObjectRef, WrapperError>;

    /// Write a real.
    fn set_real(&mut self, value: f64) -> Result<(), WrapperError>;
    /// Write an integer.
    fn set_integer(&mut self, value: i64) -> Result<(), WrapperError>;
    /// Write text.
    fn set_string(&mut self, value: &str) -> Result<(), WrapperError>;
    /// Write a boolean.
    fn set_boolean(&mut self, value: bool) -> Result<(), WrapperError>;
    /// Write an on/off flag.
    fn set_on_off(&mut self, value: bool) -> Result<(), WrapperError>;
    /// Write a matrix.
    fn set_matrix(&mut self, value: &Rmatrix) -> Result<(), WrapperError>;
    /// Copy the state of `object` into the object behind the wrapper.
    fn set_object(&mut self, object: &ObjectRef) -> Result<(), WrapperError>;
}

/// A bound, typed accessor for one identifier or literal in a script.
#[derive(Debug, Clone)]
pub struct ElementWrapper {
    description: String,
    kind: WrapperKind,
}

impl ElementWrapper {
    /// Create a wrapper. Object-backed kinds must be bound before use.
    pub fn new(description: &str, kind: WrapperKind) -> Self {
        Self {
            description: description.to_string(),
            kind,
        }
    }

    /// A real literal.
    pub fn number(description: &str, value: f64) -> Self {
        Self::new(description, WrapperKind::Number(value))
    }

    /// A string literal.
    pub fn string(description: &str, value: &str) -> Self {
        Self::new(description, WrapperKind::String(value.to_string()))
    }

    /// A wrapper bound to `object`, with the kind chosen from the object.
    pub fn for_object(description: &str, object: ObjectRef) -> Self {
        let kind: fn(Option<ObjectRef>) -> WrapperKind = {
            let o = object.borrow();
            if o.is_variable() {
                WrapperKind::Variable
            } else if o.is_array() {
                WrapperKind::Array
            } else if o.is_string_object() {
                WrapperKind::StringObject
            } else if o.is_parameter() {
                WrapperKind::Parameter
            } else {
                WrapperKind::Object
            }
        };
        Self::new(description, kind(Some(object)))
    }

    /// The text the wrapper was created from.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The backing of the wrapper.
    pub fn kind(&self) -> &WrapperKind {
        &self.kind
    }

    /// The kind of the wrapper.
    pub fn wrapper_type(&self) -> WrapperType {
        match &self.kind {
            WrapperKind::Number(_) => WrapperType::Number,
            WrapperKind::String(_) => WrapperType::String,
            WrapperKind::Boolean(_) => WrapperType::Boolean,
            WrapperKind::OnOff(_) => WrapperType::OnOff,
            WrapperKind::ObjectProperty(_) => WrapperType::ObjectProperty,
            WrapperKind::Parameter(_) => WrapperType::Parameter,
            WrapperKind::Variable(_) => WrapperType::Variable,
            WrapperKind::Array(_) => WrapperType::Array,
            WrapperKind::ArrayElement(_) => WrapperType::ArrayElement,
            WrapperKind::Object(_) => WrapperType::Object,
            WrapperKind::StringObject(_) => WrapperType::StringObject,
        }
    }

    /// The names of the objects the wrapper binds to.
    pub fn ref_object_names(&self) -> Vec<String> {
        match &self.kind {
            WrapperKind::Number(_)
            | WrapperKind::String(_)
            | WrapperKind::Boolean(_)
            | WrapperKind::OnOff(_) => Vec::new(),
            WrapperKind::ObjectProperty(property) => vec![property.owner.clone()],
            WrapperKind::ArrayElement(element) => {
                let mut names = vec![element.name.clone()];
                for name in element
                    .row
                    .ref_object_names()
                    .into_iter()
                    .chain(element.column.ref_object_names())
                {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                names
            }
            _ => vec![self.description.clone()],
        }
    }

    /// Return true if every object the wrapper needs has been bound.
    pub fn is_bound(&self) -> bool {
        match &self.kind {
            WrapperKind::Number(_)
            | WrapperKind::String(_)
            | WrapperKind::Boolean(_)
            | WrapperKind::OnOff(_) => true,
            WrapperKind::ObjectProperty(property) => property.target.is_some(),
            WrapperKind::ArrayElement(element) => {
                element.array.is_some() && element.row.is_bound() && element.column.is_bound()
            }
            WrapperKind::Parameter(object)
            | WrapperKind::Variable(object)
            | WrapperKind::Array(object)
            | WrapperKind::Object(object)
            | WrapperKind::StringObject(object) => object.is_some(),
        }
    }

    /// Bind `object` wherever the wrapper refers to it by name.
    ///
    /// Returns true if anything was bound.
    pub fn set_ref_object(&mut self, object: &ObjectRef) -> bool {
        let name = object.borrow().name().to_string();
        match &mut self.kind {
            WrapperKind::Number(_)
            | WrapperKind::String(_)
            | WrapperKind::Boolean(_)
            | WrapperKind::OnOff(_) => false,
            WrapperKind::ObjectProperty(property) => property.owner == name && property.bind(object),
            WrapperKind::ArrayElement(element) => {
                let mut bound = false;
                if element.name == name && object.borrow().is_array() {
                    element.array = Some(Rc::clone(object));
                    bound = true;
                }
                bound |= element.row.set_ref_object(object);
                bound |= element.column.set_ref_object(object);
                bound
            }
            WrapperKind::Parameter(slot)
            | WrapperKind::Variable(slot)
            | WrapperKind::Array(slot)
            | WrapperKind::Object(slot)
            | WrapperKind::StringObject(slot) => {
                if self.description == name {
                    *slot = Some(Rc::clone(object));
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Update the description and names after the object `old` is renamed to `new`.
    ///
    /// Bound objects are shared handles, so they already carry the new name.
    pub fn rename_object(&mut self, old: &str, new: &str) {
        self.description = replace_name(&self.description, old, new);
        match &mut self.kind {
            WrapperKind::ObjectProperty(property) => {
                property.owner = replace_name(&property.owner, old, new);
                property.owned = replace_name(&property.owned, old, new);
            }
            WrapperKind::ArrayElement(element) => {
                element.name = replace_name(&element.name, old, new);
                element.row.rename_object(old, new);
                element.column.rename_object(old, new);
            }
            _ => {}
        }
    }

    /// Read the value behind the wrapper in its natural type.
    pub fn evaluate(&self) -> Result<Value, WrapperError> {
        match &self.kind {
            WrapperKind::Number(value) => Ok(Value::Real(*value)),
            WrapperKind::String(value) => Ok(Value::String(value.clone())),
            WrapperKind::Boolean(value) => Ok(Value::Boolean(*value)),
            WrapperKind::OnOff(value) => Ok(Value::OnOff(*value)),
            WrapperKind::ObjectProperty(_) => {
                let (object, id) = self.property_target()?;
                let value = object.borrow().get_value(id)?;
                Ok(value)
            }
            WrapperKind::ArrayElement(element) => {
                let array = self.array(element)?;
                let (row, column) = element.indices()?;
                let value = array.borrow().array_element(row, column)?;
                Ok(Value::Real(value))
            }
            WrapperKind::Object(_) => {
                let object = self.referent()?.borrow();
                if object.is_parameter() {
                    Ok(object.evaluate()?)
                } else {
                    Ok(Value::Object(object.name().to_string()))
                }
            }
            WrapperKind::Parameter(_)
            | WrapperKind::Variable(_)
            | WrapperKind::Array(_)
            | WrapperKind::StringObject(_) => Ok(self.referent()?.borrow().evaluate()?),
        }
    }

    /// Write a value through the wrapper, converting it to the target's type.
    pub fn set_value(&mut self, value: &Value) -> Result<(), WrapperError> {
        match &self.kind {
            WrapperKind::Number(_)
            | WrapperKind::String(_)
            | WrapperKind::Boolean(_)
            | WrapperKind::OnOff(_) => Err(self.invalid("Set")),
            WrapperKind::ObjectProperty(_) => {
                let (object, id) = self.property_target()?;
                object.borrow_mut().set_value(id, value.clone())?;
                Ok(())
            }
            WrapperKind::ArrayElement(element) => {
                let array = self.array(element)?;
                let (row, column) = element.indices()?;
                array
                    .borrow_mut()
                    .set_array_element(row, column, value.try_as_real()?)?;
                Ok(())
            }
            WrapperKind::Object(_) => {
                let object = self.referent()?;
                if !object.borrow().is_parameter() {
                    return Err(self.invalid("Set"));
                }
                object.borrow_mut().assign(value.clone())?;
                Ok(())
            }
            WrapperKind::Parameter(_)
            | WrapperKind::Variable(_)
            | WrapperKind::Array(_)
            | WrapperKind::StringObject(_) => {
                self.referent()?.borrow_mut().assign(value.clone())?;
                Ok(())
            }
        }
    }

    fn referent(&self) -> Result<&ObjectRef, WrapperError> {
        match &self.kind {
            WrapperKind::Parameter(object)
            | WrapperKind::Variable(object)
            | WrapperKind::Array(object)
            | WrapperKind::Object(object)
            | WrapperKind::StringObject(object) => object
                .as_ref()
                .ok_or_else(|| WrapperError::NotBound(self.description.clone())),
            _ => Err(self.invalid("EvaluateObject")),
        }
    }

    fn property_target(&self) -> Result<(ObjectRef, usize), WrapperError> {
        match &self.kind {
            WrapperKind::ObjectProperty(property) => property
                .target
                .clone()
                .ok_or_else(|| WrapperError::NotBound(self.description.clone())),
            _ => Err(self.invalid("GetProperty")),
        }
    }

    fn array<'w>(&self, element: &'w ArrayElementRef) -> Result<&'w ObjectRef, WrapperError> {
        element
            .array
            .as_ref()
            .ok_or_else(|| WrapperError::NotBound(self.description.clone()))
    }

    fn require(&self, operation: &'static str, allowed: &[WrapperType]) -> Result<(), WrapperError> {
        if allowed.contains(&self.wrapper_type()) {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> WrapperError {
        WrapperError::InvalidOperation {
            operation,
            description: self.description.clone(),
            wrapper_type: self.wrapper_type(),
        }
    }
}

const NUMERIC: &[WrapperType] = &[
    WrapperType::Number,
    WrapperType::ObjectProperty,
    WrapperType::Parameter,
    WrapperType::Variable,
    WrapperType::Array,
    WrapperType::ArrayElement,
    WrapperType::Object,
];

const TEXT: &[WrapperType] = &[
    WrapperType::String,
    WrapperType::ObjectProperty,
    WrapperType::Parameter,
    WrapperType::StringObject,
];

const BOOLEAN: &[WrapperType] = &[
    WrapperType::Boolean,
    WrapperType::ObjectProperty,
    WrapperType::Parameter,
];

const ON_OFF: &[WrapperType] = &[
    WrapperType::OnOff,
    WrapperType::ObjectProperty,
    WrapperType::Parameter,
];

const MATRIX: &[WrapperType] = &[
    WrapperType::Array,
    WrapperType::ObjectProperty,
    WrapperType::Parameter,
    WrapperType::Object,
];

const OBJECT: &[WrapperType] = &[
    WrapperType::Object,
    WrapperType::Parameter,
    WrapperType::Variable,
    WrapperType::Array,
    WrapperType::StringObject,
];

impl ElementAccess for ElementWrapper {
    fn data_type(&self) -> ParameterType {
        match &self.kind {
            WrapperKind::Number(_) | WrapperKind::Variable(_) | WrapperKind::ArrayElement(_) => {
                ParameterType::Real
            }
            WrapperKind::String(_) | WrapperKind::StringObject(_) => ParameterType::String,
            WrapperKind::Boolean(_) => ParameterType::Boolean,
            WrapperKind::OnOff(_) => ParameterType::OnOff,
            WrapperKind::Array(_) => ParameterType::Matrix,
            WrapperKind::Object(_) => ParameterType::Object,
            WrapperKind::ObjectProperty(property) => match &property.target {
                Some((object, id)) => object
                    .borrow()
                    .property(*id)
                    .map_or(ParameterType::Unknown, |p| p.data_type),
                None => ParameterType::Unknown,
            },
            WrapperKind::Parameter(object) => object
                .as_ref()
                .map_or(ParameterType::Unknown, |o| o.borrow().return_type()),
        }
    }

    fn evaluate_real(&self) -> Result<f64, WrapperError> {
        self.require("EvaluateReal", NUMERIC)?;
        Ok(self.evaluate()?.try_as_real()?)
    }

    fn evaluate_integer(&self) -> Result<i64, WrapperError> {
        self.require("EvaluateInteger", NUMERIC)?;
        Ok(self.evaluate()?.try_as_integer()?)
    }

    fn evaluate_string(&self) -> Result<String, WrapperError> {
        self.require("EvaluateString", TEXT)?;
        match self.evaluate()? {
            Value::String(text) | Value::Object(text) => Ok(text),
            value @ (Value::StringArray(_) | Value::OnOff(_)) => Ok(value.to_string()),
            value => Ok(value.try_as_str()?.to_string()),
        }
    }

    fn evaluate_boolean(&self) -> Result<bool, WrapperError> {
        self.require("EvaluateBoolean", BOOLEAN)?;
        Ok(self.evaluate()?.try_as_boolean()?)
    }

    fn evaluate_on_off(&self) -> Result<bool, WrapperError> {
        self.require("EvaluateOnOff", ON_OFF)?;
        Ok(self.evaluate()?.try_as_on_off()?)
    }

    fn evaluate_matrix(&self) -> Result<Rmatrix, WrapperError> {
        self.require("EvaluateArray", MATRIX)?;
        Ok(self.evaluate()?.try_as_matrix()?.clone())
    }

    fn evaluate_object(&self) -> Result<ObjectRef, WrapperError> {
        self.require("EvaluateObject", OBJECT)?;
        self.referent().map(Rc::clone)
    }

    fn set_real(&mut self, value: f64) -> Result<(), WrapperError> {
        self.require("SetReal", NUMERIC)?;
        match self.wrapper_type() {
            WrapperType::Number => Err(self.invalid("SetReal")),
            WrapperType::Array => self.set_value(&Value::Matrix(Rmatrix::scalar(value))),
            _ => self.set_value(&Value::Real(value)),
        }
    }

    fn set_integer(&mut self, value: i64) -> Result<(), WrapperError> {
        self.require("SetInteger", NUMERIC)?;
        match self.wrapper_type() {
            WrapperType::Number => Err(self.invalid("SetInteger")),
            WrapperType::ObjectProperty => self.set_value(&Value::Integer(value)),
            _ => self.set_real(value as f64),
        }
    }

    fn set_string(&mut self, value: &str) -> Result<(), WrapperError> {
        self.require("SetString", TEXT)?;
        if self.wrapper_type() == WrapperType::String {
            return Err(self.invalid("SetString"));
        }
        self.set_value(&Value::from(value))
    }

    fn set_boolean(&mut self, value: bool) -> Result<(), WrapperError> {
        self.require("SetBoolean", BOOLEAN)?;
        if self.wrapper_type() == WrapperType::Boolean {
            return Err(self.invalid("SetBoolean"));
        }
        self.set_value(&Value::Boolean(value))
    }

    fn set_on_off(&mut self, value: bool) -> Result<(), WrapperError> {
        self.require("SetOnOff", ON_OFF)?;
        if self.wrapper_type() == WrapperType::OnOff {
            return Err(self.invalid("SetOnOff"));
        }
        self.set_value(&Value::OnOff(value))
    }

    fn set_matrix(&mut self, value: &Rmatrix) -> Result<(), WrapperError> {
        self.require("SetArray", MATRIX)?;
        self.set_value(&Value::Matrix(value.clone()))
    }

    fn set_object(&mut self, object: &ObjectRef) -> Result<(), WrapperError> {
        self.require("SetObject", &[WrapperType::Object])?;
        let target = self.referent()?;
        if Rc::ptr_eq(target, object) {
            return Ok(());
        }
        let source = object.borrow();
        let mut target = target.borrow_mut();
        if source.type_name() != target.type_name() {
            return Err(WrapperError::ObjectTypeMismatch {
                description: self.description.clone(),
                expected: target.type_name().to_string(),
                actual: source.type_name().to_string(),
            });
        }
        target.copy_from(&source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mscript_object::Object;

    #[test]
    fn test_literals() {
        let number = ElementWrapper::number("2.5", 2.5);
        assert_eq!(number.evaluate_real().unwrap(), 2.5);
        assert!(matches!(
            number.evaluate_string(),
            Err(WrapperError::InvalidOperation { .. })
        ));
        assert!(number.ref_object_names().is_empty());

        let mut text = ElementWrapper::string("'abc'", "abc");
        assert_eq!(text.evaluate_string().unwrap(), "abc");
        assert!(text.set_string("x").is_err());
        assert!(text.evaluate_real().is_err());
    }

    #[test]
    fn test_unbound_wrapper() {
        let wrapper = ElementWrapper::new("x", WrapperKind::Variable(None));
        assert!(!wrapper.is_bound());
        assert!(matches!(
            wrapper.evaluate_real(),
            Err(WrapperError::NotBound(_))
        ));

        let mut wrapper = wrapper;
        let x = Object::variable("x", 4.0).into_ref();
        assert!(wrapper.set_ref_object(&x));
        assert_eq!(wrapper.evaluate_real().unwrap(), 4.0);
        wrapper.set_real(5.0).unwrap();
        assert_eq!(x.borrow().evaluate().unwrap(), Value::Real(5.0));
    }

    #[test]
    fn test_object_property() {
        let sat = Object::spacecraft("sat1").into_ref();
        let mut wrapper = ElementWrapper::new(
            "sat1.DryMass",
            WrapperKind::ObjectProperty(PropertyRef::new("sat1", "", "DryMass")),
        );
        assert!(wrapper.set_ref_object(&sat));
        assert_eq!(wrapper.data_type(), ParameterType::Real);
        wrapper.set_real(900.0).unwrap();
        assert_eq!(sat.borrow().get_real("DryMass").unwrap(), 900.0);
        assert_eq!(wrapper.ref_object_names(), ["sat1"]);

        let mut format = ElementWrapper::new(
            "sat1.DateFormat",
            WrapperKind::ObjectProperty(PropertyRef::new("sat1", "", "DateFormat")),
        );
        assert!(format.set_ref_object(&sat));
        assert!(format.set_string("Bogus").is_err());
        format.set_string("UTCGregorian").unwrap();
        assert_eq!(format.evaluate_string().unwrap(), "UTCGregorian");
    }

    #[test]
    fn test_owned_property() {
        let fm = Object::force_model("fm").into_ref();
        let mut wrapper = ElementWrapper::new(
            "fm.GravityField.Earth.Degree",
            WrapperKind::ObjectProperty(PropertyRef::new("fm", "GravityField.Earth", "Degree")),
        );
        assert!(wrapper.set_ref_object(&fm));
        wrapper.set_integer(8).unwrap();
        assert_eq!(wrapper.evaluate_integer().unwrap(), 8);
    }

    #[test]
    fn test_array_element() {
        let array = Object::array("A", 2, 2).into_ref();
        let i = Object::variable("i", 2.0).into_ref();
        let mut wrapper = ElementWrapper::new(
            "A(i,1)",
            WrapperKind::ArrayElement(ArrayElementRef::new(
                "A",
                ElementWrapper::new("i", WrapperKind::Variable(None)),
                ElementWrapper::number("1", 1.0),
            )),
        );
        assert_eq!(wrapper.ref_object_names(), ["A", "i"]);
        assert!(wrapper.set_ref_object(&array));
        assert!(!wrapper.is_bound());
        assert!(wrapper.set_ref_object(&i));
        assert!(wrapper.is_bound());

        wrapper.set_real(7.0).unwrap();
        assert_eq!(array.borrow().array_element(1, 0).unwrap(), 7.0);
        assert_eq!(wrapper.evaluate_real().unwrap(), 7.0);

        i.borrow_mut().assign(Value::Real(3.0)).unwrap();
        let error = wrapper.evaluate_real().unwrap_err();
        assert!(error.to_string().contains("valid rows are 1 to 2"));

        i.borrow_mut().assign(Value::Real(1.5)).unwrap();
        assert!(matches!(
            wrapper.evaluate_real(),
            Err(WrapperError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn test_rename() {
        let sat = Object::spacecraft("sat1").into_ref();
        let mut wrapper = ElementWrapper::new(
            "sat1.X",
            WrapperKind::ObjectProperty(PropertyRef::new("sat1", "", "X")),
        );
        wrapper.set_ref_object(&sat);
        wrapper.rename_object("sat1", "satA");
        assert_eq!(wrapper.description(), "satA.X");
        assert_eq!(wrapper.ref_object_names(), ["satA"]);
    }

    #[test]
    fn test_set_object_copies_state() {
        let target = Object::spacecraft("sat1").into_ref();
        let source = Object::spacecraft("sat2").into_ref();
        source.borrow_mut().set("X", 1.0).unwrap();

        let mut wrapper = ElementWrapper::for_object("sat1", Rc::clone(&target));
        assert_eq!(wrapper.wrapper_type(), WrapperType::Object);
        wrapper.set_object(&source).unwrap();
        assert_eq!(target.borrow().get_real("X").unwrap(), 1.0);
        assert_eq!(target.borrow().name(), "sat1");

        let burn = Object::impulsive_burn("b").into_ref();
        assert!(matches!(
            wrapper.set_object(&burn),
            Err(WrapperError::ObjectTypeMismatch { .. })
        ));
    }
}
