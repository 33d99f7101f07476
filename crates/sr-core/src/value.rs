use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Native callable exposed to scripts. `Err` carries the value thrown into the script.
pub type HostFn = dyn Fn(&[ScriptValue]) -> Result<ScriptValue, ScriptValue>;

/// Host-side accessor; evaluating it never runs script code.
pub type HostGetter = dyn Fn() -> ScriptValue;

const MAX_DISPLAY_DEPTH: usize = 8;

#[derive(Clone)]
pub struct HostFunction {
    name: Rc<str>,
    func: Rc<HostFn>,
    writes_back_options: bool,
}

impl HostFunction {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[ScriptValue]) -> Result<ScriptValue, ScriptValue> + 'static,
    ) -> Self {
        Self {
            name: Rc::from(name.into()),
            func: Rc::new(func),
            writes_back_options: false,
        }
    }

    /// Marks the function as updating an option object passed as its first or last
    /// argument, so engines with value semantics copy the object back after the call.
    pub fn writing_back_options(mut self) -> Self {
        self.writes_back_options = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn writes_back_options(&self) -> bool {
        self.writes_back_options
    }

    pub fn call(&self, args: &[ScriptValue]) -> Result<ScriptValue, ScriptValue> {
        (self.func)(args)
    }

    pub fn same_as(&self, other: &HostFunction) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostFunction({})", self.name)
    }
}

impl PartialEq for HostFunction {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

/// A value owned by the engine that the shell can carry around but not inspect.
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: String,
    text: String,
    payload: Rc<dyn Any>,
}

impl OpaqueValue {
    pub fn new(type_name: impl Into<String>, text: impl Into<String>, payload: Rc<dyn Any>) -> Self {
        Self {
            type_name: type_name.into(),
            text: text.into(),
            payload,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn payload(&self) -> &dyn Any {
        self.payload.as_ref()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({}: {})", self.type_name, self.text)
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.payload, &other.payload)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertyFlags {
    pub read_only: bool,
    pub undeletable: bool,
}

impl PropertyFlags {
    pub const NONE: Self = Self {
        read_only: false,
        undeletable: false,
    };
    pub const READ_ONLY: Self = Self {
        read_only: true,
        undeletable: false,
    };
    pub const UNDELETABLE: Self = Self {
        read_only: false,
        undeletable: true,
    };
    pub const SEALED: Self = Self {
        read_only: true,
        undeletable: true,
    };
}

/// One enumerated property of a live value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: ScriptValue,
    pub read_only: bool,
}

#[derive(Clone)]
enum Slot {
    Value(ScriptValue),
    Getter(Rc<HostGetter>),
}

#[derive(Clone)]
struct Entry {
    name: String,
    slot: Slot,
    flags: PropertyFlags,
}

/// Ordered property map with reference semantics: clones share the same properties.
#[derive(Clone, Default)]
pub struct ScriptObject {
    entries: Rc<RefCell<Vec<Entry>>>,
}

impl ScriptObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ptr_eq(&self, other: &ScriptObject) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }

    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.entries) as *const () as usize
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().iter().any(|entry| entry.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub fn flags(&self, name: &str) -> Option<PropertyFlags> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.flags)
    }

    pub fn is_getter(&self, name: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|entry| entry.name == name && matches!(entry.slot, Slot::Getter(_)))
    }

    pub fn get(&self, name: &str) -> Option<ScriptValue> {
        let slot = self
            .entries
            .borrow()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.slot.clone())?;
        Some(resolve_slot(slot))
    }

    /// Assigns like a script would: read-only properties and getters are left alone.
    pub fn set(&self, name: &str, value: ScriptValue) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                if entry.flags.read_only || matches!(entry.slot, Slot::Getter(_)) {
                    return false;
                }
                entry.slot = Slot::Value(value);
                true
            }
            None => {
                entries.push(Entry {
                    name: name.to_string(),
                    slot: Slot::Value(value),
                    flags: PropertyFlags::NONE,
                });
                true
            }
        }
    }

    /// Host-side definition: replaces value and flags unconditionally, keeping position.
    pub fn define(&self, name: &str, value: ScriptValue, flags: PropertyFlags) {
        self.define_slot(name, Slot::Value(value), flags);
    }

    pub fn define_getter(
        &self,
        name: &str,
        getter: impl Fn() -> ScriptValue + 'static,
        flags: PropertyFlags,
    ) {
        self.define_slot(name, Slot::Getter(Rc::new(getter)), flags);
    }

    fn define_slot(&self, name: &str, slot: Slot, flags: PropertyFlags) {
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.slot = slot;
                entry.flags = flags;
            }
            None => entries.push(Entry {
                name: name.to_string(),
                slot,
                flags,
            }),
        }
    }

    pub fn remove(&self, name: &str) -> bool {
        let mut entries = self.entries.borrow_mut();
        let Some(index) = entries.iter().position(|entry| entry.name == name) else {
            return false;
        };
        if entries[index].flags.undeletable {
            return false;
        }
        entries.remove(index);
        true
    }

    pub fn properties(&self) -> Vec<Property> {
        let snapshot = self.entries.borrow().clone();
        snapshot
            .into_iter()
            .map(|entry| Property {
                name: entry.name,
                read_only: entry.flags.read_only || matches!(entry.slot, Slot::Getter(_)),
                value: resolve_slot(entry.slot),
            })
            .collect()
    }

    pub fn with(self, name: &str, value: impl Into<ScriptValue>) -> Self {
        self.define(name, value.into(), PropertyFlags::NONE);
        self
    }
}

fn resolve_slot(slot: Slot) -> ScriptValue {
    match slot {
        Slot::Value(value) => value,
        Slot::Getter(getter) => getter(),
    }
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScriptObject").field(&self.names()).finish()
    }
}

impl PartialEq for ScriptObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScriptValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<ScriptValue>),
    Object(ScriptObject),
    Function(HostFunction),
    Opaque(OpaqueValue),
}

impl ScriptValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) if value.fract() == 0.0 && value.is_finite() => Some(*value as i64),
            Self::Bool(value) => Some(i64::from(*value)),
            Self::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ScriptObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Function(_) => "function",
            Self::Opaque(opaque) => opaque.type_name(),
        }
    }

    /// Looks up a property the way a dotted access would; misses yield `Undefined`.
    pub fn property(&self, name: &str) -> ScriptValue {
        match self {
            Self::Object(object) => object.get(name).unwrap_or_default(),
            Self::Array(items) => name
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index).cloned())
                .unwrap_or_default(),
            _ => Self::Undefined,
        }
    }

    /// Own enumerable properties; values without a property graph have none.
    pub fn own_properties(&self) -> Vec<Property> {
        match self {
            Self::Object(object) => object.properties(),
            Self::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, value)| Property {
                    name: index.to_string(),
                    value: value.clone(),
                    read_only: false,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn write_literal(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{:?}", value),
            other => other.write_display(f, depth),
        }
    }

    fn write_display(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{}", value)
                }
            }
            Self::String(value) => f.write_str(value),
            Self::Array(items) => {
                if depth >= MAX_DISPLAY_DEPTH {
                    return f.write_str("[...]");
                }
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_literal(f, depth + 1)?;
                }
                f.write_str("]")
            }
            Self::Object(object) => {
                if depth >= MAX_DISPLAY_DEPTH {
                    return f.write_str("#{...}");
                }
                f.write_str("#{")?;
                for (index, property) in object.properties().iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: ", property.name)?;
                    property.value.write_literal(f, depth + 1)?;
                }
                f.write_str("}")
            }
            Self::Function(function) => write!(f, "fn {}()", function.name()),
            Self::Opaque(opaque) => f.write_str(opaque.text()),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_display(f, 0)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<ScriptValue>> for ScriptValue {
    fn from(value: Vec<ScriptValue>) -> Self {
        Self::Array(value)
    }
}

impl From<ScriptObject> for ScriptValue {
    fn from(value: ScriptObject) -> Self {
        Self::Object(value)
    }
}

impl From<HostFunction> for ScriptValue {
    fn from(value: HostFunction) -> Self {
        Self::Function(value)
    }
}
