//! Name-indexed storage of configured objects.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    replace_name, strip_index_suffix, Object, ObjectError, ObjectKind, ObjectRef, ObjectType,
};

/// The objects configured by a script, indexed by name.
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: IndexMap<String, ObjectRef>,
    solar_system: Option<ObjectRef>,
}

impl ObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the default solar system and coordinate systems.
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        store.set_solar_system(Object::solar_system());
        for (name, axes) in [
            ("EarthMJ2000Eq", "MJ2000Eq"),
            ("EarthMJ2000Ec", "MJ2000Ec"),
            ("EarthFixed", "BodyFixed"),
        ] {
            if let Ok(cs) = Object::coordinate_system(name, "Earth", Some(axes)) {
                let _ = store.add(cs);
            }
        }
        store
    }

    /// Add an object and return its handle.
    pub fn add(&mut self, object: Object) -> Result<ObjectRef, ObjectError> {
        let object = object.into_ref();
        self.add_ref(Rc::clone(&object))?;
        Ok(object)
    }

    /// Add an existing handle.
    pub fn add_ref(&mut self, object: ObjectRef) -> Result<(), ObjectError> {
        let name = object.borrow().name().to_string();
        if self.objects.contains_key(&name) {
            return Err(ObjectError::DuplicateName(name));
        }
        self.objects.insert(name, object);
        Ok(())
    }

    /// Install the solar system, replacing any previous one.
    pub fn set_solar_system(&mut self, solar_system: Object) -> ObjectRef {
        let solar_system = solar_system.into_ref();
        self.solar_system = Some(Rc::clone(&solar_system));
        solar_system
    }

    /// The solar system, if one is installed.
    pub fn solar_system(&self) -> Option<&ObjectRef> {
        self.solar_system.as_ref()
    }

    /// Look up an object by name.
    ///
    /// An array index suffix is ignored, `SolarSystem` names the solar system, and names
    /// that are not configured objects fall back to the solar system's bodies.
    pub fn find_object(&self, name: &str) -> Option<ObjectRef> {
        let name = strip_index_suffix(name);
        if name == "SolarSystem" {
            return self.solar_system.clone();
        }
        if let Some(object) = self.objects.get(name) {
            return Some(Rc::clone(object));
        }
        self.solar_system
            .as_ref()
            .and_then(|ss| ss.borrow().find_owned(name))
    }

    /// Look up an object by name, requiring it to have the given type.
    pub fn find_object_of_type(&self, name: &str, object_type: ObjectType) -> Option<ObjectRef> {
        self.find_object(name)
            .filter(|object| object.borrow().is_of_type(object_type))
    }

    /// Look up a Parameter (including Variables, Arrays and Strings) by name.
    pub fn get_parameter(&self, name: &str) -> Option<ObjectRef> {
        self.find_object_of_type(name, ObjectType::Parameter)
    }

    /// Return true if a configured object has this exact name.
    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Remove an object.
    pub fn remove(&mut self, name: &str) -> Option<ObjectRef> {
        self.objects.shift_remove(name)
    }

    /// The configured objects in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectRef> {
        self.objects.values()
    }

    /// The number of configured objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Return true if there are no configured objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Rename an object.
    ///
    /// References to the object held by other objects are updated, and Parameters whose
    /// names contain the old name are renamed too (`sat1.X` becomes `satA.X`).
    pub fn rename_object(&mut self, old: &str, new: &str) -> Result<(), ObjectError> {
        if !self.objects.contains_key(old) {
            return Err(ObjectError::UndefinedObject(old.to_string()));
        }
        if self.find_object(new).is_some() {
            return Err(ObjectError::DuplicateName(new.to_string()));
        }

        let objects = std::mem::take(&mut self.objects);
        self.objects = objects
            .into_iter()
            .map(|(key, object)| {
                let renamed = replace_name(&key, old, new);
                if renamed != key {
                    object.borrow_mut().set_name(&renamed);
                }
                (renamed, object)
            })
            .collect();

        for object in self.objects.values() {
            object.borrow_mut().rename_references(old, new);
        }
        log::debug!("Renamed \"{}\" to \"{}\"", old, new);
        Ok(())
    }
}

/// The objects visible while interpreting a script or function body.
///
/// Lookups search the local store, then the global store. New objects are always added to
/// the local store.
#[derive(Debug)]
pub struct ObjectScope<'a> {
    local: &'a mut ObjectStore,
    global: Option<&'a ObjectStore>,
}

impl<'a> ObjectScope<'a> {
    /// A scope with only a local store.
    pub fn new(local: &'a mut ObjectStore) -> Self {
        Self {
            local,
            global: None,
        }
    }

    /// A scope with a local store backed by a global store.
    pub fn with_global(local: &'a mut ObjectStore, global: &'a ObjectStore) -> Self {
        Self {
            local,
            global: Some(global),
        }
    }

    /// The local store.
    pub fn local(&self) -> &ObjectStore {
        &*self.local
    }

    /// The local store, mutably.
    pub fn local_mut(&mut self) -> &mut ObjectStore {
        &mut *self.local
    }

    /// The global store, if any.
    pub fn global(&self) -> Option<&ObjectStore> {
        self.global
    }

    /// Look up an object in the local store, then the global store.
    pub fn find_object(&self, name: &str) -> Option<ObjectRef> {
        self.local
            .find_object(name)
            .or_else(|| self.global.and_then(|global| global.find_object(name)))
    }

    /// Look up an object, requiring it to have the given type.
    pub fn find_object_of_type(&self, name: &str, object_type: ObjectType) -> Option<ObjectRef> {
        self.find_object(name)
            .filter(|object| object.borrow().is_of_type(object_type))
    }

    /// Look up a Parameter in the local store, then the global store.
    pub fn get_parameter(&self, name: &str) -> Option<ObjectRef> {
        self.find_object_of_type(name, ObjectType::Parameter)
    }

    /// Bind the owners of Parameters that were created before their owner existed.
    ///
    /// Returns the names of Parameters whose owner still cannot be found.
    pub fn bind_parameters(&self) -> Vec<String> {
        let mut unresolved = Vec::new();
        for object in self.local.objects() {
            let (owner_name, dependency) = match object.borrow().kind() {
                ObjectKind::Parameter(param) if !param.is_bound() => (
                    param.owner_name().to_string(),
                    param.dependency().to_string(),
                ),
                _ => continue,
            };
            let owner = self.find_object(&owner_name);
            let dependency = Some(dependency.as_str())
                .filter(|d| !d.is_empty())
                .and_then(|d| self.find_object(d));

            let mut object = object.borrow_mut();
            if owner.is_none() {
                unresolved.push(object.name().to_string());
            }
            if let ObjectKind::Parameter(param) = object.kind_mut() {
                param.bind(owner, dependency);
            }
        }
        unresolved
    }
}
