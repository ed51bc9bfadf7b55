use mscript_object::{ObjectRef, ObjectScope, ObjectType, ParameterFactory, ParameterName};

use crate::{
    parse::{
        is_braced, is_quoted, parse_array_index, remove_extra_paren, remove_quotes, to_boolean,
        to_on_off, to_real, ArrayIndex,
    },
    ArrayElementRef,
    ClassifyError::{self, *},
    ElementWrapper, PropertyRef, WrapperKind,
};

/// Policy for descriptions that could be classified more than one way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Prefer a system Parameter over an object property for `owner.name`.
    pub parameters_first: bool,
    /// Classify an unknown bare identifier as a string instead of failing.
    pub create_default_string: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            parameters_first: true,
            create_default_string: true,
        }
    }
}

impl ClassifyOptions {
    /// The default options with the given Parameter policy.
    pub fn parameters_first(parameters_first: bool) -> Self {
        Self {
            parameters_first,
            ..Self::default()
        }
    }

    /// Options for array indices, which never fall back to strings or Parameters first.
    fn index() -> Self {
        Self {
            parameters_first: false,
            create_default_string: false,
        }
    }
}

/// Classify `description` and return a bound wrapper for it.
///
/// See [Classifier::create].
pub fn create_element_wrapper(
    scope: &mut ObjectScope<'_>,
    factory: &ParameterFactory,
    description: &str,
    options: ClassifyOptions,
) -> Result<ElementWrapper, ClassifyError> {
    Classifier::new(scope, factory).create(description, options)
}

/// Turns identifier and literal descriptions into bound [ElementWrapper]s.
#[derive(Debug)]
pub struct Classifier<'c, 'a> {
    scope: &'c mut ObjectScope<'a>,
    factory: &'c ParameterFactory,
}

impl<'c, 'a> Classifier<'c, 'a> {
    /// Create a classifier that resolves names in `scope`.
    pub fn new(scope: &'c mut ObjectScope<'a>, factory: &'c ParameterFactory) -> Self {
        Self { scope, factory }
    }

    /// Classify `description` and return a bound wrapper for it.
    ///
    /// In order of precedence, the description is a string literal (`'text'` or `{a, b}`), a
    /// number, an array element `A(r, c)`, a dotted name, or a bare identifier. Dotted names may
    /// create a system Parameter in the local store as a side effect.
    pub fn create(
        &mut self,
        description: &str,
        options: ClassifyOptions,
    ) -> Result<ElementWrapper, ClassifyError> {
        let description = remove_extra_paren(description);
        let wrapper = self.classify(description, options)?;
        log::debug!(
            "Created {} wrapper for \"{}\"",
            wrapper.wrapper_type(),
            description
        );
        Ok(wrapper)
    }

    fn classify(
        &mut self,
        description: &str,
        options: ClassifyOptions,
    ) -> Result<ElementWrapper, ClassifyError> {
        if is_quoted(description) {
            return Ok(ElementWrapper::string(
                description,
                remove_quotes(description),
            ));
        }
        if is_braced(description) {
            return Ok(ElementWrapper::string(description, description));
        }
        if let Some(value) = to_real(description) {
            return Ok(ElementWrapper::number(description, value));
        }
        if let Some(index) = parse_array_index(description)? {
            return self.array_element(description, index);
        }
        if description.contains('.') {
            return self.dotted(description, options);
        }
        self.other(description, options)
    }

    fn array_element(
        &mut self,
        description: &str,
        index: ArrayIndex,
    ) -> Result<ElementWrapper, ClassifyError> {
        let array = self
            .scope
            .find_object(&index.name)
            .ok_or_else(|| ArrayNotFound(index.name.clone()))?;
        if !array.borrow().is_array() {
            return Err(NotAnArray(index.name));
        }

        let row = self.create(&index.row, ClassifyOptions::index())?;
        let column = self.create(&index.column, ClassifyOptions::index())?;
        let mut wrapper = ElementWrapper::new(
            description,
            WrapperKind::ArrayElement(ArrayElementRef::new(&index.name, row, column)),
        );
        wrapper.set_ref_object(&array);
        Ok(wrapper)
    }

    fn dotted(
        &mut self,
        description: &str,
        options: ClassifyOptions,
    ) -> Result<ElementWrapper, ClassifyError> {
        let parts = ParameterName::parse(description);
        let owner = self.scope.find_object(&parts.owner);

        if let Some(owner) = &owner {
            let owner_type = owner.borrow().object_type();
            match owner_type {
                ObjectType::SolarSystem => {
                    return solar_system_property(description, owner, &parts)
                }
                ObjectType::ForceModel | ObjectType::PropSetup | ObjectType::CoordinateSystem => {
                    return property_wrapper(description, owner, &parts).ok_or_else(|| {
                        OwnedFieldNotFound {
                            description: description.to_string(),
                            owner: parts.owner.clone(),
                            owner_type,
                        }
                    })
                }
                _ => {}
            }
        }
        self.valid_dotted(description, &parts, owner.as_ref(), options)
    }

    /// Resolve `owner.name` or `owner.dependency.name` on an ordinary owner.
    ///
    /// Names with two dots are Parameters, except on burns whose fields are looked up first.
    /// For a single dot the options decide between Parameter and property.
    fn valid_dotted(
        &mut self,
        description: &str,
        parts: &ParameterName,
        owner: Option<&ObjectRef>,
        options: ClassifyOptions,
    ) -> Result<ElementWrapper, ClassifyError> {
        let is_burn = owner.map_or(false, |o| o.borrow().is_of_type(ObjectType::Burn));
        let two_dots = description.matches('.').count() > 1;
        let parameter_first = if two_dots {
            !is_burn
        } else {
            options.parameters_first
        };

        if parameter_first {
            match self.parameter(description, parts) {
                Ok(wrapper) => return Ok(wrapper),
                Err(error) if two_dots || owner.is_none() => return Err(error),
                Err(_) => {}
            }
        }

        if let Some(owner) = owner {
            if let Some(wrapper) = property_wrapper(description, owner, parts) {
                return Ok(wrapper);
            }
            if parameter_first || !self.factory.is_parameter_type(&parts.type_name) {
                return Err(NoValidField {
                    description: description.to_string(),
                });
            }
        }
        self.parameter(description, parts)
    }

    fn parameter(
        &mut self,
        description: &str,
        parts: &ParameterName,
    ) -> Result<ElementWrapper, ClassifyError> {
        let parameter = self
            .factory
            .create_parameter(
                self.scope,
                &parts.type_name,
                description,
                &parts.owner,
                &parts.dependency,
            )
            .map_err(|error| Parameter {
                description: description.to_string(),
                error,
            })?;
        Ok(ElementWrapper::for_object(description, parameter))
    }

    /// A bare identifier: a configured object, then `true`/`false`, then `On`/`Off`.
    fn other(
        &mut self,
        description: &str,
        options: ClassifyOptions,
    ) -> Result<ElementWrapper, ClassifyError> {
        if let Some(object) = self.scope.find_object(description) {
            return Ok(ElementWrapper::for_object(description, object));
        }
        if let Some(value) = to_boolean(description) {
            return Ok(ElementWrapper::new(description, WrapperKind::Boolean(value)));
        }
        if let Some(value) = to_on_off(description) {
            return Ok(ElementWrapper::new(description, WrapperKind::OnOff(value)));
        }
        if options.create_default_string {
            return Ok(ElementWrapper::string(description, description));
        }
        Err(UndefinedObject(description.to_string()))
    }
}

/// `SolarSystem.name` or `SolarSystem.Body.name`.
fn solar_system_property(
    description: &str,
    solar_system: &ObjectRef,
    parts: &ParameterName,
) -> Result<ElementWrapper, ClassifyError> {
    let body = parts.dependency.split('.').next().unwrap_or_default();
    if !body.is_empty() && solar_system.borrow().find_owned(body).is_none() {
        return Err(BodyNotFound(body.to_string()));
    }
    let mut reference = PropertyRef::new(&parts.owner, body, &parts.type_name);
    if !reference.bind(solar_system) {
        return Err(ClassifyError::ObjectError(
            mscript_object::ObjectError::UndefinedProperty {
                object: if body.is_empty() { parts.owner.as_str() } else { body }.to_string(),
                property: parts.type_name.clone(),
            },
        ));
    }
    Ok(ElementWrapper::new(
        description,
        WrapperKind::ObjectProperty(reference),
    ))
}

/// A field of `owner`, or of the owned sub-object named by the dependency part.
fn property_wrapper(
    description: &str,
    owner: &ObjectRef,
    parts: &ParameterName,
) -> Option<ElementWrapper> {
    let mut reference = PropertyRef::new(&parts.owner, &parts.dependency, &parts.type_name);
    if !reference.bind(owner) {
        return None;
    }
    Some(ElementWrapper::new(
        description,
        WrapperKind::ObjectProperty(reference),
    ))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use mscript_data_type::{ParameterType, Value};
    use mscript_object::{Object, ObjectStore};

    use super::*;
    use crate::{ElementAccess, WrapperType};

    fn store() -> ObjectStore {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut store = ObjectStore::with_defaults();
        store.add(Object::spacecraft("sat1")).unwrap();
        store.add(Object::array("A", 3, 3)).unwrap();
        store.add(Object::variable("i", 2.0)).unwrap();
        store.add(Object::string("s", "text")).unwrap();
        store.add(Object::force_model("fm")).unwrap();
        store.add(Object::impulsive_burn("burn1")).unwrap();
        store
    }

    fn classify(
        store: &mut ObjectStore,
        description: &str,
        options: ClassifyOptions,
    ) -> Result<ElementWrapper, ClassifyError> {
        let factory = ParameterFactory::new();
        let mut scope = ObjectScope::new(store);
        create_element_wrapper(&mut scope, &factory, description, options)
    }

    #[test]
    fn test_numbers_ignore_policy() {
        let mut store = store();
        for text in ["3.14", "-2", "1e3", ".5"] {
            for parameters_first in [true, false] {
                let wrapper =
                    classify(&mut store, text, ClassifyOptions::parameters_first(parameters_first))
                        .unwrap();
                assert_eq!(wrapper.wrapper_type(), WrapperType::Number);
                assert_eq!(wrapper.evaluate_real().unwrap(), text.parse::<f64>().unwrap());
            }
        }
    }

    #[test]
    fn test_quotes_take_precedence() {
        let mut store = store();
        let wrapper = classify(&mut store, "'3.14'", ClassifyOptions::default()).unwrap();
        assert_eq!(wrapper.wrapper_type(), WrapperType::String);
        assert_eq!(wrapper.evaluate_string().unwrap(), "3.14");

        let wrapper = classify(&mut store, "{Earth, Luna}", ClassifyOptions::default()).unwrap();
        assert_eq!(wrapper.evaluate_string().unwrap(), "{Earth, Luna}");
    }

    #[test]
    fn test_dot_policy() {
        let mut store = store();
        let wrapper =
            classify(&mut store, "sat1.X", ClassifyOptions::parameters_first(true)).unwrap();
        assert_eq!(wrapper.wrapper_type(), WrapperType::Parameter);
        let wrapper =
            classify(&mut store, "sat1.X", ClassifyOptions::parameters_first(false)).unwrap();
        assert_eq!(wrapper.wrapper_type(), WrapperType::ObjectProperty);
        assert_eq!(wrapper.evaluate_real().unwrap(), 7100.0);

        let wrapper =
            classify(&mut store, "sat1.Cd", ClassifyOptions::parameters_first(true)).unwrap();
        assert_eq!(wrapper.wrapper_type(), WrapperType::ObjectProperty);

        let wrapper = classify(
            &mut store,
            "sat1.Earth.SMA",
            ClassifyOptions::parameters_first(false),
        )
        .unwrap();
        assert_eq!(wrapper.wrapper_type(), WrapperType::Parameter);
    }

    #[test]
    fn test_array_element_recursion() {
        let mut store = store();
        let wrapper = classify(&mut store, "A(i,2)", ClassifyOptions::default()).unwrap();
        let element = match wrapper.kind() {
            WrapperKind::ArrayElement(element) => element,
            kind => panic!("expected an array element, found {:?}", kind),
        };
        assert_eq!(element.row().wrapper_type(), WrapperType::Variable);
        assert_eq!(element.row().ref_object_names(), ["i"]);
        assert_eq!(element.column().wrapper_type(), WrapperType::Number);
        assert_eq!(element.column().evaluate_real().unwrap(), 2.0);
        assert!(wrapper.is_bound());
    }

    #[test]
    fn test_parameter_creation_is_idempotent() {
        let mut store = store();
        let first = classify(&mut store, "sat1.SMA", ClassifyOptions::default()).unwrap();
        let second = classify(&mut store, "sat1.SMA", ClassifyOptions::default()).unwrap();
        assert!(Rc::ptr_eq(
            &first.evaluate_object().unwrap(),
            &second.evaluate_object().unwrap()
        ));
        assert!(store.contains("sat1.SMA"));
    }

    #[test]
    fn test_bare_identifiers() {
        let mut store = store();
        let options = ClassifyOptions::default();
        let kinds = [
            ("i", WrapperType::Variable),
            ("A", WrapperType::Array),
            ("s", WrapperType::StringObject),
            ("sat1", WrapperType::Object),
            ("Earth", WrapperType::Object),
            ("TRUE", WrapperType::Boolean),
            ("off", WrapperType::OnOff),
            ("freeText", WrapperType::String),
            ("(i)", WrapperType::Variable),
        ];
        for (text, expected) in kinds {
            let wrapper = classify(&mut store, text, options).unwrap();
            assert_eq!(wrapper.wrapper_type(), expected, "{}", text);
        }

        let strict = ClassifyOptions {
            parameters_first: true,
            create_default_string: false,
        };
        let error = classify(&mut store, "freeText", strict).unwrap_err();
        assert_eq!(error.to_string(), "Nonexistent object \"freeText\"");
    }

    #[test]
    fn test_string_parameter() {
        let mut store = store();
        let wrapper =
            classify(&mut store, "sat1.A1Gregorian", ClassifyOptions::default()).unwrap();
        assert_eq!(wrapper.wrapper_type(), WrapperType::StringObject);
        assert_eq!(
            wrapper.evaluate_string().unwrap(),
            "01 Jan 2000 12:00:00.000"
        );
    }

    #[test]
    fn test_special_owners() {
        let mut store = store();
        let options = ClassifyOptions::default();

        let mu = classify(&mut store, "SolarSystem.Earth.Mu", options).unwrap();
        assert_eq!(mu.evaluate_real().unwrap(), 398_600.4415);
        let source = classify(&mut store, "SolarSystem.EphemerisSource", options).unwrap();
        assert_eq!(source.evaluate_string().unwrap(), "DE405");
        let error = classify(&mut store, "SolarSystem.Pluto.Mu", options).unwrap_err();
        assert_eq!(
            error.to_string(),
            "The body named \"Pluto\" not found in the SolarSystem"
        );

        let degree = classify(&mut store, "fm.Degree", options).unwrap();
        assert_eq!(degree.data_type(), ParameterType::Integer);
        let flux = classify(&mut store, "fm.SRP.Flux", options).unwrap();
        assert_eq!(flux.evaluate_real().unwrap(), 1367.0);
        assert!(matches!(
            classify(&mut store, "fm.Bogus", options),
            Err(OwnedFieldNotFound { .. })
        ));

        let origin = classify(&mut store, "EarthMJ2000Eq.Origin", options).unwrap();
        assert_eq!(origin.evaluate().unwrap(), Value::Object("Earth".into()));
    }

    #[test]
    fn test_errors() {
        let mut store = store();
        let options = ClassifyOptions::default();

        let error = classify(&mut store, "B(1,1)", options).unwrap_err();
        assert_eq!(error.to_string(), "The Array \"B\" does not exist");
        let error = classify(&mut store, "i(1)", options).unwrap_err();
        assert_eq!(error.to_string(), "\"i\" is not an Array");
        let error = classify(&mut store, "A(1, nothing)", options).unwrap_err();
        assert!(matches!(error, UndefinedObject(_)));

        let error = classify(&mut store, "sat1.Bogus", options).unwrap_err();
        assert_eq!(
            error.to_string(),
            "\"sat1.Bogus\" does not have a valid field of object or owned object"
        );
        let error = classify(&mut store, "ghost.Bogus", options).unwrap_err();
        assert!(error
            .to_string()
            .ends_with("\"Bogus\" is not a valid Parameter Type"));
    }

    #[test]
    fn test_forward_referenced_parameter() {
        let mut store = store();
        let wrapper = classify(&mut store, "later.VMAG", ClassifyOptions::default()).unwrap();
        assert_eq!(wrapper.wrapper_type(), WrapperType::Parameter);
        assert!(wrapper.evaluate_real().is_err());
    }

    #[test]
    fn test_burn_fields_before_parameters() {
        let mut store = store();
        let wrapper =
            classify(&mut store, "burn1.Element1", ClassifyOptions::parameters_first(false))
                .unwrap();
        assert_eq!(wrapper.wrapper_type(), WrapperType::ObjectProperty);
        let wrapper =
            classify(&mut store, "burn1.Element1", ClassifyOptions::parameters_first(true))
                .unwrap();
        assert_eq!(wrapper.wrapper_type(), WrapperType::Parameter);
    }
}
