//! System Parameters and the factory that creates them.

use std::rc::Rc;

use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use mscript_data_type::{ParameterType, Value};
use once_cell::sync::Lazy;

use crate::{
    replace_name, Object, ObjectError, ObjectKind, ObjectRef, ObjectScope, ObjectType,
    ParameterName,
};

/// Computes a Parameter value from its owner and optional dependency object.
pub type EvaluateFn = fn(&Object, Option<&Object>) -> Result<Value, ObjectError>;

/// Writes a Parameter value back to its owner.
pub type AssignFn = fn(&mut Object, &Value) -> Result<(), ObjectError>;

/// Gravitational parameter used when a Parameter has no body to read `Mu` from (km^3/s^2).
pub const EARTH_MU: f64 = 398_600.4415;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days from the spacecraft's `InitialEpoch` to its current `Epoch`.
fn elapsed_days(owner: &Object) -> Result<f64, ObjectError> {
    Ok(owner.get_real("Epoch")? - owner.get_real("InitialEpoch")?)
}

/// What the middle part of `owner.dependency.type` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// The Parameter takes no dependency.
    None,
    /// A coordinate system, e.g. `sat1.EarthMJ2000Eq.X`.
    CoordinateSystem,
    /// A central body, e.g. `sat1.Earth.SMA`.
    CelestialBody,
}

impl DependencyKind {
    /// The dependency used when the name omits it.
    pub fn default_name(self) -> Option<&'static str> {
        match self {
            DependencyKind::None => None,
            DependencyKind::CoordinateSystem => Some("EarthMJ2000Eq"),
            DependencyKind::CelestialBody => Some("Earth"),
        }
    }
}

/// The definition of a Parameter type.
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    /// The type token, e.g. `SMA`.
    pub type_name: String,
    /// The type of the computed value.
    pub return_type: ParameterType,
    /// The type the owner object must have.
    pub owner_type: ObjectType,
    /// The dependency the Parameter takes.
    pub dependency: DependencyKind,
    /// Computes the value.
    pub evaluate: EvaluateFn,
    /// Writes the value back to the owner, for settable Parameters.
    pub assign: Option<AssignFn>,
}

impl ParameterInfo {
    /// Return true if values can be assigned through the Parameter.
    pub fn is_settable(&self) -> bool {
        self.assign.is_some()
    }
}

macro_rules! owner_field {
    ($name:literal, $owner:expr, $dependency:expr) => {
        ParameterInfo {
            type_name: $name.into(),
            return_type: ParameterType::Real,
            owner_type: $owner,
            dependency: $dependency,
            evaluate: |owner, _| owner.get($name),
            assign: Some(|owner, value| owner.set($name, value.clone())),
        }
    };
}

macro_rules! computed {
    ($name:literal, $owner:expr, $dependency:expr, $return_type:expr, $evaluate:expr) => {
        ParameterInfo {
            type_name: $name.into(),
            return_type: $return_type,
            owner_type: $owner,
            dependency: $dependency,
            evaluate: $evaluate,
            assign: None,
        }
    };
}

static BUILTIN_PARAMETERS: Lazy<Vec<ParameterInfo>> = Lazy::new(|| {
    use DependencyKind::{CelestialBody, CoordinateSystem};
    use ObjectType::{Burn, Spacecraft};
    use ParameterType::Real;

    vec![
        owner_field!("X", Spacecraft, CoordinateSystem),
        owner_field!("Y", Spacecraft, CoordinateSystem),
        owner_field!("Z", Spacecraft, CoordinateSystem),
        owner_field!("VX", Spacecraft, CoordinateSystem),
        owner_field!("VY", Spacecraft, CoordinateSystem),
        owner_field!("VZ", Spacecraft, CoordinateSystem),
        owner_field!("DryMass", Spacecraft, DependencyKind::None),
        owner_field!("Element1", Burn, DependencyKind::None),
        owner_field!("Element2", Burn, DependencyKind::None),
        owner_field!("Element3", Burn, DependencyKind::None),
        computed!("RMAG", Spacecraft, CelestialBody, Real, |owner, _| {
            Ok(Value::Real(norm(&state(owner)?[..3])))
        }),
        computed!("VMAG", Spacecraft, CelestialBody, Real, |owner, _| {
            Ok(Value::Real(norm(&state(owner)?[3..])))
        }),
        computed!("SMA", Spacecraft, CelestialBody, Real, |owner, body| {
            Ok(Value::Real(Keplerian::compute(owner, body)?.sma))
        }),
        computed!("ECC", Spacecraft, CelestialBody, Real, |owner, body| {
            Ok(Value::Real(Keplerian::compute(owner, body)?.ecc))
        }),
        computed!("INC", Spacecraft, CelestialBody, Real, |owner, body| {
            Ok(Value::Real(Keplerian::compute(owner, body)?.inc))
        }),
        computed!("Energy", Spacecraft, CelestialBody, Real, |owner, body| {
            Ok(Value::Real(Keplerian::compute(owner, body)?.energy))
        }),
        computed!("TotalMass", Spacecraft, DependencyKind::None, Real, |owner, _| {
            owner.get("DryMass")
        }),
        computed!("A1ModJulian", Spacecraft, DependencyKind::None, Real, |owner, _| {
            owner.get("Epoch")
        }),
        computed!("ElapsedDays", Spacecraft, DependencyKind::None, Real, |owner, _| {
            Ok(Value::Real(elapsed_days(owner)?))
        }),
        computed!("ElapsedSecs", Spacecraft, DependencyKind::None, Real, |owner, _| {
            Ok(Value::Real(elapsed_days(owner)? * SECONDS_PER_DAY))
        }),
        computed!(
            "A1Gregorian",
            Spacecraft,
            DependencyKind::None,
            ParameterType::String,
            |owner, _| {
                let epoch = owner.get_real("Epoch")?;
                gregorian(epoch).map(Value::String).ok_or_else(|| {
                    ObjectError::InvalidPropertyValue {
                        object: owner.name().to_string(),
                        property: "Epoch".to_string(),
                        value: Value::Real(epoch),
                        accepted: "epochs between the years -262144 and 262143".to_string(),
                    }
                })
            }
        ),
    ]
});

/// The registered Parameter types, and creation of Parameter objects.
#[derive(Debug, Clone)]
pub struct ParameterFactory {
    types: IndexMap<String, ParameterInfo>,
}

impl Default for ParameterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterFactory {
    /// Create a factory with the built-in Parameter types registered.
    pub fn new() -> Self {
        let mut factory = Self::empty();
        for info in BUILTIN_PARAMETERS.iter() {
            factory.register(info.clone());
        }
        factory
    }

    /// Create a factory with no registered types.
    pub fn empty() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a Parameter type, replacing any existing type with the same name.
    pub fn register(&mut self, info: ParameterInfo) {
        self.types.insert(info.type_name.clone(), info);
    }

    /// Look up a registered type.
    pub fn info(&self, type_name: &str) -> Option<&ParameterInfo> {
        self.types.get(type_name)
    }

    /// Return true if `type_name` is a registered Parameter type.
    pub fn is_parameter_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Return true if `type_name` is a registered, settable Parameter type.
    pub fn is_settable(&self, type_name: &str) -> bool {
        self.info(type_name).map_or(false, ParameterInfo::is_settable)
    }

    /// The registered type names in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Return true if the last dotted part of `description` is a registered Parameter type.
    pub fn is_parameter_description(&self, description: &str) -> bool {
        self.is_parameter_type(&ParameterName::parse(description).type_name)
    }

    /// Find or create the Parameter named by a dotted description such as `sat1.Earth.SMA`.
    pub fn create_from_description(
        &self,
        scope: &mut ObjectScope<'_>,
        description: &str,
    ) -> Result<ObjectRef, ObjectError> {
        let parts = ParameterName::parse(description);
        self.create_parameter(
            scope,
            &parts.type_name,
            description,
            &parts.owner,
            &parts.dependency,
        )
    }

    /// Find or create a Parameter.
    ///
    /// If a Parameter named `name` is already visible in `scope`, it is returned unchanged.
    /// Otherwise a new Parameter is registered in the local store before returning. The owner
    /// does not need to exist yet; an unresolved owner is bound later by
    /// [ObjectScope::bind_parameters] or reported by reference checking.
    pub fn create_parameter(
        &self,
        scope: &mut ObjectScope<'_>,
        type_name: &str,
        name: &str,
        owner: &str,
        dependency: &str,
    ) -> Result<ObjectRef, ObjectError> {
        if let Some(existing) = scope.get_parameter(name) {
            return Ok(existing);
        }

        let info = self
            .info(type_name)
            .ok_or_else(|| ObjectError::UnknownParameterType(type_name.to_string()))?;

        let owner_object = scope.find_object(owner);
        if let Some(owner_object) = &owner_object {
            if !owner_object.borrow().is_of_type(info.owner_type) {
                return Err(ObjectError::WrongOwnerType {
                    parameter: name.to_string(),
                    owner: owner.to_string(),
                    expected: info.owner_type,
                });
            }
        }

        let dependency = if dependency.is_empty() {
            info.dependency.default_name().unwrap_or_default()
        } else {
            dependency
        };
        let dependency_object = if dependency.is_empty() {
            None
        } else {
            scope.find_object(dependency)
        };

        let parameter = SystemParameter {
            info: info.clone(),
            owner_name: owner.to_string(),
            dependency: dependency.to_string(),
            owner: owner_object,
            dependency_object,
        };
        let object = Object::new(name, type_name, ObjectType::Parameter)
            .with_kind(ObjectKind::Parameter(parameter))
            .into_ref();
        scope.local_mut().add_ref(Rc::clone(&object))?;

        log::debug!("Created {} Parameter \"{}\"", type_name, name);
        Ok(object)
    }
}

/// A Parameter computed from an owner object.
#[derive(Debug, Clone)]
pub struct SystemParameter {
    info: ParameterInfo,
    owner_name: String,
    dependency: String,
    owner: Option<ObjectRef>,
    dependency_object: Option<ObjectRef>,
}

impl SystemParameter {
    /// The Parameter type token.
    pub fn type_name(&self) -> &str {
        &self.info.type_name
    }

    /// The owner's name.
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// The dependency's name, after defaulting.
    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    /// The owner, if it has been bound.
    pub fn owner(&self) -> Option<&ObjectRef> {
        self.owner.as_ref()
    }

    /// The type of the computed value.
    pub fn return_type(&self) -> ParameterType {
        self.info.return_type
    }

    /// Return true if values can be assigned through the Parameter.
    pub fn is_settable(&self) -> bool {
        self.info.is_settable()
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.owner.is_some()
    }

    pub(crate) fn bind(&mut self, owner: Option<ObjectRef>, dependency: Option<ObjectRef>) {
        if owner.is_some() {
            self.owner = owner;
        }
        if dependency.is_some() {
            self.dependency_object = dependency;
        }
    }

    pub(crate) fn evaluate(&self, name: &str) -> Result<Value, ObjectError> {
        let owner = self.bound_owner(name)?.borrow();
        let dependency = self.dependency_object.as_ref().map(|d| d.borrow());
        (self.info.evaluate)(&owner, dependency.as_deref())
    }

    pub(crate) fn assign(&mut self, name: &str, value: &Value) -> Result<(), ObjectError> {
        let assign = self
            .info
            .assign
            .ok_or_else(|| ObjectError::ParameterNotSettable(name.to_string()))?;
        let mut owner = self.bound_owner(name)?.borrow_mut();
        assign(&mut owner, value)
    }

    pub(crate) fn rename_references(&mut self, old: &str, new: &str) {
        if self.owner_name == old {
            self.owner_name = new.to_string();
        }
        if !self.dependency.is_empty() {
            // Renamed in place, where the dependency is followed by the type.
            let renamed = replace_name(&format!("{}.", self.dependency), old, new);
            self.dependency = renamed[..renamed.len() - 1].to_string();
        }
    }

    fn bound_owner(&self, name: &str) -> Result<&ObjectRef, ObjectError> {
        self.owner
            .as_ref()
            .ok_or_else(|| ObjectError::ParameterOwnerMissing {
                parameter: name.to_string(),
                owner: self.owner_name.clone(),
            })
    }
}

fn state(owner: &Object) -> Result<[f64; 6], ObjectError> {
    let mut state = [0.0; 6];
    for (value, field) in state.iter_mut().zip(["X", "Y", "Z", "VX", "VY", "VZ"]) {
        *value = owner.get_real(field)?;
    }
    Ok(state)
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Two-body orbital elements computed from the Cartesian state.
struct Keplerian {
    sma: f64,
    ecc: f64,
    /// Degrees.
    inc: f64,
    energy: f64,
}

impl Keplerian {
    fn compute(owner: &Object, body: Option<&Object>) -> Result<Self, ObjectError> {
        let mu = match body {
            Some(body) if body.is_of_type(ObjectType::CelestialBody) => body.get_real("Mu")?,
            _ => EARTH_MU,
        };
        let s = state(owner)?;
        let (r, v) = ([s[0], s[1], s[2]], [s[3], s[4], s[5]]);
        let r_mag = norm(&r);
        let v_mag = norm(&v);

        let h = [
            r[1] * v[2] - r[2] * v[1],
            r[2] * v[0] - r[0] * v[2],
            r[0] * v[1] - r[1] * v[0],
        ];
        let energy = v_mag * v_mag / 2.0 - mu / r_mag;
        let r_dot_v: f64 = r.iter().zip(&v).map(|(a, b)| a * b).sum();
        let e_vec: Vec<f64> = (0..3)
            .map(|i| ((v_mag * v_mag - mu / r_mag) * r[i] - r_dot_v * v[i]) / mu)
            .collect();

        Ok(Self {
            sma: -mu / (2.0 * energy),
            ecc: norm(&e_vec),
            inc: (h[2] / norm(&h)).clamp(-1.0, 1.0).acos().to_degrees(),
            energy,
        })
    }
}

/// The modified Julian date of 01 Jan 2000 12:00:00.
const J2000_MOD_JULIAN: f64 = 21545.0;

/// Format a modified Julian epoch as `DD Mon YYYY HH:MM:SS.mmm`.
fn gregorian(mod_julian: f64) -> Option<String> {
    let j2000 = NaiveDate::from_ymd_opt(2000, 1, 1)?.and_hms_opt(12, 0, 0)?;
    let ms = ((mod_julian - J2000_MOD_JULIAN) * 86_400_000.0).round();
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return None;
    }
    let time = j2000.checked_add_signed(Duration::milliseconds(ms as i64))?;
    Some(time.format("%d %b %Y %H:%M:%S%.3f").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectStore;

    #[test]
    fn test_gregorian() {
        assert_eq!(gregorian(21545.0).unwrap(), "01 Jan 2000 12:00:00.000");
        assert_eq!(gregorian(21544.5).unwrap(), "01 Jan 2000 00:00:00.000");
        assert_eq!(gregorian(21604.75).unwrap(), "01 Mar 2000 06:00:00.000");
        assert!(gregorian(f64::MAX).is_none());
    }

    #[test]
    fn test_elapsed_time() {
        let mut store = ObjectStore::with_defaults();
        let sat = store.add(Object::spacecraft("sat1")).unwrap();
        let factory = ParameterFactory::new();
        let mut scope = ObjectScope::new(&mut store);
        let secs = factory
            .create_from_description(&mut scope, "sat1.ElapsedSecs")
            .unwrap();
        let days = factory
            .create_from_description(&mut scope, "sat1.ElapsedDays")
            .unwrap();
        assert_eq!(secs.borrow().evaluate().unwrap(), Value::Real(0.0));

        sat.borrow_mut().set("Epoch", 21545.5).unwrap();
        assert_eq!(days.borrow().evaluate().unwrap(), Value::Real(0.5));
        assert_eq!(secs.borrow().evaluate().unwrap(), Value::Real(43_200.0));
        assert!(!factory.info("ElapsedSecs").unwrap().is_settable());
    }

    #[test]
    fn test_create_is_idempotent() {
        let mut store = ObjectStore::with_defaults();
        store.add(Object::spacecraft("sat1")).unwrap();
        let factory = ParameterFactory::new();
        let mut scope = ObjectScope::new(&mut store);

        let first = factory
            .create_from_description(&mut scope, "sat1.SMA")
            .unwrap();
        let second = factory
            .create_from_description(&mut scope, "sat1.SMA")
            .unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_type() {
        let mut store = ObjectStore::new();
        let factory = ParameterFactory::new();
        let mut scope = ObjectScope::new(&mut store);
        let error = factory
            .create_from_description(&mut scope, "sat1.Bogus")
            .unwrap_err();
        assert_eq!(error.to_string(), "\"Bogus\" is not a valid Parameter Type");
    }

    #[test]
    fn test_wrong_owner_type() {
        let mut store = ObjectStore::new();
        store.add(Object::impulsive_burn("burn1")).unwrap();
        let factory = ParameterFactory::new();
        let mut scope = ObjectScope::new(&mut store);
        assert!(matches!(
            factory.create_from_description(&mut scope, "burn1.SMA"),
            Err(ObjectError::WrongOwnerType { .. })
        ));
    }

    #[test]
    fn test_keplerian_circular_orbit() {
        let mut store = ObjectStore::with_defaults();
        let sat = store.add(Object::spacecraft("sat1")).unwrap();
        {
            let mut sat = sat.borrow_mut();
            let v = (EARTH_MU / 7000.0).sqrt();
            for (field, value) in [("X", 7000.0), ("Y", 0.0), ("Z", 0.0)] {
                sat.set(field, value).unwrap();
            }
            for (field, value) in [("VX", 0.0), ("VY", 0.0), ("VZ", v)] {
                sat.set(field, value).unwrap();
            }
        }
        let factory = ParameterFactory::new();
        let mut scope = ObjectScope::new(&mut store);
        let sma = factory
            .create_from_description(&mut scope, "sat1.Earth.SMA")
            .unwrap();
        let inc = factory
            .create_from_description(&mut scope, "sat1.INC")
            .unwrap();
        let ecc = factory
            .create_from_description(&mut scope, "sat1.ECC")
            .unwrap();

        assert!((sma.borrow().evaluate().unwrap().as_real() - 7000.0).abs() < 1e-6);
        assert!((inc.borrow().evaluate().unwrap().as_real() - 90.0).abs() < 1e-9);
        assert!(ecc.borrow().evaluate().unwrap().as_real() < 1e-9);
    }

    #[test]
    fn test_settable_parameter_writes_owner() {
        let mut store = ObjectStore::with_defaults();
        let sat = store.add(Object::spacecraft("sat1")).unwrap();
        let factory = ParameterFactory::new();
        let mut scope = ObjectScope::new(&mut store);
        let x = factory
            .create_from_description(&mut scope, "sat1.EarthMJ2000Eq.X")
            .unwrap();
        x.borrow_mut().assign(Value::Real(42.0)).unwrap();
        assert_eq!(sat.borrow().get_real("X").unwrap(), 42.0);

        let rmag = factory
            .create_from_description(&mut scope, "sat1.RMAG")
            .unwrap();
        assert!(matches!(
            rmag.borrow_mut().assign(Value::Real(1.0)),
            Err(ObjectError::ParameterNotSettable(_))
        ));
    }
}
