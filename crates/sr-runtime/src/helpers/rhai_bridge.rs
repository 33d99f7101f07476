use std::any::Any;
use std::rc::Rc;

use rhai::{Array, Dynamic, FnPtr, ImmutableString, Map, FLOAT, INT};
use sr_core::{HostFunction, OpaqueValue, ScriptObject, ScriptValue};

pub(crate) fn rhai_function_symbol(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    out
}

/// Host functions stored inside objects. Rhai sees them as `FnPtr` values whose
/// target is a generated native function taking the receiver as first argument.
///
/// Also remembers which object properties were cyclic back edges, so writing
/// the `()` placeholder back does not clear them.
#[derive(Default)]
pub(crate) struct HostSymbols {
    entries: Vec<(String, HostFunction)>,
    cut_edges: Vec<(usize, String)>,
}

impl HostSymbols {
    pub(crate) fn intern(&mut self, function: &HostFunction) -> String {
        if let Some((symbol, _)) = self
            .entries
            .iter()
            .find(|(_, known)| known.same_as(function))
        {
            return symbol.clone();
        }
        let symbol = format!(
            "sr_host_{}_{}",
            rhai_function_symbol(function.name()),
            self.entries.len()
        );
        self.entries.push((symbol.clone(), function.clone()));
        symbol
    }

    pub(crate) fn lookup(&self, symbol: &str) -> Option<&HostFunction> {
        self.entries
            .iter()
            .find(|(known, _)| known == symbol)
            .map(|(_, function)| function)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(String, HostFunction)> {
        self.entries.iter()
    }

    fn cut_edge(&mut self, owner: &ScriptObject, name: &str) {
        self.cut_edges.push((owner.id(), name.to_string()));
    }

    pub(crate) fn is_cut_edge(&self, owner: &ScriptObject, name: &str) -> bool {
        self.cut_edges
            .iter()
            .any(|(id, known)| *id == owner.id() && known == name)
    }
}

pub(crate) fn value_to_dynamic(value: &ScriptValue, symbols: &mut HostSymbols) -> Dynamic {
    let mut visiting = Vec::new();
    to_dynamic(value, symbols, &mut visiting)
}

fn to_dynamic(value: &ScriptValue, symbols: &mut HostSymbols, visiting: &mut Vec<usize>) -> Dynamic {
    match value {
        ScriptValue::Undefined | ScriptValue::Null => Dynamic::UNIT,
        ScriptValue::Bool(value) => Dynamic::from_bool(*value),
        ScriptValue::Int(value) => Dynamic::from_int(*value as INT),
        ScriptValue::Float(value) => Dynamic::from_float(*value as FLOAT),
        ScriptValue::String(value) => Dynamic::from(value.clone()),
        ScriptValue::Array(values) => {
            let mut array = Array::new();
            for value in values {
                array.push(to_dynamic(value, symbols, visiting));
            }
            Dynamic::from_array(array)
        }
        ScriptValue::Object(object) => {
            // A cycle cannot be expressed with Rhai maps; the back edge becomes `()`.
            if visiting.contains(&object.id()) {
                return Dynamic::UNIT;
            }
            visiting.push(object.id());
            let mut map = Map::new();
            for property in object.properties() {
                let value = match &property.value {
                    ScriptValue::Object(child) if visiting.contains(&child.id()) => {
                        symbols.cut_edge(object, &property.name);
                        Dynamic::UNIT
                    }
                    other => to_dynamic(other, symbols, visiting),
                };
                map.insert(property.name.into(), value);
            }
            visiting.pop();
            Dynamic::from_map(map)
        }
        ScriptValue::Function(function) => match FnPtr::new(symbols.intern(function)) {
            Ok(pointer) => Dynamic::from(pointer),
            Err(error) => {
                log::warn!("cannot expose host function {}: {}", function.name(), error);
                Dynamic::UNIT
            }
        },
        ScriptValue::Opaque(opaque) => opaque
            .payload()
            .downcast_ref::<Dynamic>()
            .cloned()
            .unwrap_or(Dynamic::UNIT),
    }
}

pub(crate) fn dynamic_to_value(value: Dynamic, symbols: &HostSymbols) -> ScriptValue {
    if value.is_unit() {
        return ScriptValue::Undefined;
    }
    if value.is::<bool>() {
        return ScriptValue::Bool(value.cast::<bool>());
    }
    if value.is::<INT>() {
        return ScriptValue::Int(value.cast::<INT>() as i64);
    }
    if value.is::<FLOAT>() {
        return ScriptValue::Float(value.cast::<FLOAT>() as f64);
    }
    if value.is::<ImmutableString>() {
        return ScriptValue::String(value.cast::<ImmutableString>().to_string());
    }
    if value.is::<char>() {
        return ScriptValue::String(value.cast::<char>().to_string());
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_value(item, symbols));
        }
        return ScriptValue::Array(out);
    }
    if value.is::<Map>() {
        let object = ScriptObject::new();
        for (key, item) in value.cast::<Map>() {
            object.set(key.as_str(), dynamic_to_value(item, symbols));
        }
        return ScriptValue::Object(object);
    }
    if value.is::<FnPtr>() {
        let pointer = value.clone().cast::<FnPtr>();
        if let Some(function) = symbols.lookup(pointer.fn_name()) {
            return ScriptValue::Function(function.clone());
        }
    }
    opaque(value)
}

fn opaque(value: Dynamic) -> ScriptValue {
    let type_name = value.type_name().to_string();
    let text = value.to_string();
    let payload: Rc<dyn Any> = Rc::new(value);
    ScriptValue::Opaque(OpaqueValue::new(type_name, text, payload))
}

/// Applies a Rhai map produced by a script onto the live object it was built from,
/// so object identity, getters and read-only entries survive the round trip.
pub(crate) fn write_back_object(target: &ScriptObject, map: Map, symbols: &HostSymbols) {
    let mut seen = Vec::with_capacity(map.len());
    for (key, value) in map {
        let name = key.to_string();
        assign_dynamic(target, &name, value, symbols);
        seen.push(name);
    }
    for name in target.names() {
        if !seen.contains(&name) && !target.is_getter(&name) {
            target.remove(&name);
        }
    }
}

pub(crate) fn assign_dynamic(target: &ScriptObject, name: &str, value: Dynamic, symbols: &HostSymbols) {
    if target.is_getter(name) || target.flags(name).is_some_and(|flags| flags.read_only) {
        return;
    }
    match target.get(name) {
        Some(ScriptValue::Object(current)) if value.is::<Map>() => {
            write_back_object(&current, value.cast::<Map>(), symbols);
        }
        Some(ScriptValue::Object(_)) if value.is_unit() && symbols.is_cut_edge(target, name) => {}
        Some(ScriptValue::Function(_)) => {}
        _ => {
            target.set(name, dynamic_to_value(value, symbols));
        }
    }
}
