//! Constructors for the supported object kinds.

use mscript_data_type::{ParameterType, Value};

use crate::{ArrayData, Object, ObjectError, ObjectKind, ObjectType, Property};

const DATE_FORMATS: &[&str] = &[
    "A1ModJulian",
    "TAIModJulian",
    "UTCModJulian",
    "TTModJulian",
    "A1Gregorian",
    "TAIGregorian",
    "UTCGregorian",
    "TTGregorian",
];

const STATE_TYPES: &[&str] = &["Cartesian", "Keplerian", "ModifiedKeplerian", "Equinoctial"];

const BURN_AXES: &[&str] = &["VNB", "LVLH", "MJ2000Eq", "SpacecraftBody"];

/// Axis system types that can be attached to a coordinate system.
pub const AXIS_TYPES: &[&str] = &[
    "MJ2000Eq",
    "MJ2000Ec",
    "BodyFixed",
    "ObjectReferenced",
    "TOEEq",
    "MOEEq",
    "TODEq",
    "MODEq",
    "GSE",
    "GSM",
];

impl Object {
    /// A spacecraft in a default low Earth orbit.
    pub fn spacecraft(name: &str) -> Self {
        Object::new(name, "Spacecraft", ObjectType::Spacecraft)
            .with_property(Property::real("Epoch", 21545.0))
            .with_property(Property::real("InitialEpoch", 21545.0))
            .with_property(Property::enumeration(
                "DateFormat",
                "A1ModJulian",
                DATE_FORMATS,
            ))
            .with_property(Property::reference(
                "CoordinateSystem",
                ObjectType::CoordinateSystem,
                "EarthMJ2000Eq",
            ))
            .with_property(Property::enumeration(
                "DisplayStateType",
                "Cartesian",
                STATE_TYPES,
            ))
            .with_property(Property::real("X", 7100.0))
            .with_property(Property::real("Y", 0.0))
            .with_property(Property::real("Z", 1300.0))
            .with_property(Property::real("VX", 0.0))
            .with_property(Property::real("VY", 7.35))
            .with_property(Property::real("VZ", 1.0))
            .with_property(Property::real("DryMass", 850.0))
            .with_property(Property::real("Cd", 2.2))
            .with_property(Property::real("Cr", 1.8))
            .with_property(Property::real("DragArea", 15.0))
            .with_property(Property::real("SRPArea", 1.0))
            .with_property(Property::string("Id", "SatId"))
    }

    /// An impulsive maneuver.
    pub fn impulsive_burn(name: &str) -> Self {
        Object::new(name, "ImpulsiveBurn", ObjectType::Burn)
            .with_property(Property::string("CoordinateSystem", "Local"))
            .with_property(Property::reference(
                "Origin",
                ObjectType::CelestialBody,
                "Earth",
            ))
            .with_property(Property::enumeration("Axes", "VNB", BURN_AXES))
            .with_property(Property::real("Element1", 0.0))
            .with_property(Property::real("Element2", 0.0))
            .with_property(Property::real("Element3", 0.0))
            .with_property(Property::boolean("DecrementMass", false))
            .with_property(Property::real("Isp", 300.0))
            .with_property(Property::real("GravitationalAccel", 9.81))
    }

    /// A user Variable.
    pub fn variable(name: &str, value: f64) -> Self {
        Object::new(name, "Variable", ObjectType::Parameter).with_kind(ObjectKind::Variable(value))
    }

    /// A user Array of the given size, filled with zeros.
    ///
    /// A zero dimension leaves the size unset.
    pub fn array(name: &str, rows: usize, cols: usize) -> Self {
        let mut array = Self::array_unsized(name);
        let _ = array.set_array_size(rows, cols);
        array
    }

    /// A user Array whose size has not been set yet.
    pub fn array_unsized(name: &str) -> Self {
        Object::new(name, "Array", ObjectType::Parameter)
            .with_kind(ObjectKind::Array(ArrayData::default()))
    }

    /// A user String.
    pub fn string(name: &str, value: &str) -> Self {
        Object::new(name, "String", ObjectType::Parameter)
            .with_kind(ObjectKind::String(value.to_string()))
    }

    /// The solar system with its default bodies.
    pub fn solar_system() -> Self {
        Object::new("SolarSystem", "SolarSystem", ObjectType::SolarSystem)
            .with_property(Property::enumeration(
                "EphemerisSource",
                "DE405",
                &["DE405", "DE421", "DE424", "SPICE"],
            ))
            .with_property(Property::boolean("UseTTForEphemeris", false))
            .with_property(Property::real("EphemerisUpdateInterval", 0.0))
            .with_owned(Self::celestial_body("Sun", 132_712_440_017.99, 695_990.0))
            .with_owned(Self::celestial_body("Earth", 398_600.4415, 6378.1363))
            .with_owned(Self::celestial_body("Luna", 4902.8005821478, 1738.2))
            .with_owned(Self::celestial_body("Mars", 42_828.314, 3396.19))
    }

    /// A celestial body with gravitational parameter `mu` (km^3/s^2) and radius (km).
    pub fn celestial_body(name: &str, mu: f64, radius: f64) -> Self {
        Object::new(name, "CelestialBody", ObjectType::CelestialBody)
            .with_property(Property::real("Mu", mu))
            .with_property(Property::real("EquatorialRadius", radius))
            .with_property(Property::real("Flattening", 0.0))
            .with_property(Property::real("NutationUpdateInterval", 60.0))
    }

    /// A force model with an Earth gravity field and solar radiation pressure.
    pub fn force_model(name: &str) -> Self {
        let gravity = Object::new("GravityField.Earth", "GravityField", ObjectType::PhysicalModel)
            .with_property(Property::integer("Degree", 4))
            .with_property(Property::integer("Order", 4))
            .with_property(Property::filename("PotentialFile", "JGM2.cof"))
            .with_property(Property::integer("StmLimit", 100));
        let srp = Object::new("SRP", "SolarRadiationPressure", ObjectType::PhysicalModel)
            .with_property(Property::real("Flux", 1367.0))
            .with_property(Property::real("Nominal_Sun", 149_597_870.691));

        Object::new(name, "ForceModel", ObjectType::ForceModel)
            .with_property(Property::reference(
                "CentralBody",
                ObjectType::CelestialBody,
                "Earth",
            ))
            .with_property(Property::string_array("PrimaryBodies", &["Earth"]))
            .with_property(Property::string_array("PointMasses", &[]))
            .with_property(Property::string("Drag", "None"))
            .with_property(Property::on_off("SRP", false))
            .with_property(Property::enumeration(
                "ErrorControl",
                "RSSStep",
                &["None", "RSSStep", "RSSState", "LargestStep", "LargestState"],
            ))
            .with_owned(gravity)
            .with_owned(srp)
    }

    /// A propagator setup pairing a force model with an integrator.
    pub fn prop_setup(name: &str) -> Self {
        let integrator = Object::new("RungeKutta89", "RungeKutta89", ObjectType::Propagator)
            .with_property(Property::real("InitialStepSize", 60.0))
            .with_property(Property::real("Accuracy", 1e-12))
            .with_property(Property::real("MinStep", 0.001))
            .with_property(Property::real("MaxStep", 2700.0))
            .with_property(Property::integer("MaxStepAttempts", 50));

        Object::new(name, "PropSetup", ObjectType::PropSetup)
            .with_property(Property::reference("FM", ObjectType::ForceModel, ""))
            .with_property(Property::enumeration(
                "Type",
                "RungeKutta89",
                &["RungeKutta89", "PrinceDormand78", "AdamsBashforthMoulton"],
            ))
            .with_owned(integrator)
    }

    /// A coordinate system, optionally with an axis system of type `axes`.
    pub fn coordinate_system(
        name: &str,
        origin: &str,
        axes: Option<&str>,
    ) -> Result<Self, ObjectError> {
        let mut cs = Object::new(name, "CoordinateSystem", ObjectType::CoordinateSystem)
            .with_property(Property::reference("Origin", ObjectType::SpacePoint, origin))
            .with_property(Property::string("Axes", axes.unwrap_or_default()));
        if let Some(axes) = axes {
            cs = cs.with_owned(Self::axis_system(axes)?);
        }
        Ok(cs)
    }

    /// An axis system of one of the [AXIS_TYPES].
    pub fn axis_system(axis_type: &str) -> Result<Self, ObjectError> {
        if !AXIS_TYPES.contains(&axis_type) {
            return Err(ObjectError::InvalidPropertyValue {
                object: "CoordinateSystem".into(),
                property: "Axes".into(),
                value: Value::from(axis_type),
                accepted: AXIS_TYPES.join(", "),
            });
        }
        Ok(Object::new(axis_type, axis_type, ObjectType::AxisSystem)
            .with_property(Property::real("Epoch", 21545.0))
            .with_property(Property::reference(
                "Primary",
                ObjectType::SpacePoint,
                "",
            ))
            .with_property(Property::reference(
                "Secondary",
                ObjectType::SpacePoint,
                "",
            ))
            .with_property(Property::string("XAxis", ""))
            .with_property(Property::string("YAxis", ""))
            .with_property(Property::string("ZAxis", "")))
    }

    /// Return true if a coordinate system has an axis system attached.
    pub fn has_axis_system(&self) -> bool {
        self.owned()
            .iter()
            .any(|o| o.borrow().object_type() == ObjectType::AxisSystem)
    }

    /// A Lagrange point of a primary/secondary pair.
    pub fn libration_point(name: &str, primary: &str, secondary: &str, point: &str) -> Self {
        Object::new(name, "LibrationPoint", ObjectType::CalculatedPoint)
            .with_property(Property::reference(
                "Primary",
                ObjectType::SpacePoint,
                primary,
            ))
            .with_property(Property::reference(
                "Secondary",
                ObjectType::SpacePoint,
                secondary,
            ))
            .with_property(Property::enumeration(
                "Point",
                point,
                &["L1", "L2", "L3", "L4", "L5"],
            ))
    }

    /// A report file subscriber.
    pub fn report_file(name: &str) -> Self {
        Object::new(name, "ReportFile", ObjectType::Subscriber)
            .with_property(Property::filename("Filename", &format!("{}.txt", name)))
            .with_property(Property::integer("Precision", 16))
            .with_property(Property::boolean("WriteHeaders", true))
            .with_property(Property::on_off("ZeroFill", false))
            .with_property(Property::integer("ColumnWidth", 23))
    }

    /// Create an object of a script type name, e.g. `Create Spacecraft sat1`.
    pub fn create(type_name: &str, name: &str) -> Result<Self, ObjectError> {
        let object = match type_name {
            "Spacecraft" => Self::spacecraft(name),
            "ImpulsiveBurn" => Self::impulsive_burn(name),
            "Variable" => Self::variable(name, 0.0),
            "Array" => Self::array_unsized(name),
            "String" => Self::string(name, ""),
            "ForceModel" => Self::force_model(name),
            "Propagator" | "PropSetup" => Self::prop_setup(name),
            "CoordinateSystem" => Self::coordinate_system(name, "Earth", None)?,
            "LibrationPoint" => Self::libration_point(name, "Sun", "Earth", "L1"),
            "ReportFile" => Self::report_file(name),
            _ => return Err(ObjectError::UndefinedObject(type_name.to_string())),
        };
        Ok(object)
    }

    /// The type of value a user Parameter or property would hold for `type_name`.
    pub fn parameter_type_of(type_name: &str) -> ParameterType {
        match type_name {
            "Variable" => ParameterType::Real,
            "Array" => ParameterType::Matrix,
            "String" => ParameterType::String,
            _ => ParameterType::Object,
        }
    }
}
