//! Array built-in.
//!
//! Provides the Array constructor, `Array.isArray`/`from`/`of` and the prototype methods.
//! Methods operate on real arrays only; array-like receivers are rejected.

use std::cmp::Ordering;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{invalid_array_length, is_valid_array_length, JsObjectType};
use crate::runner::ds::operations::object::{get_value_property, iterate_to_vec};
use crate::runner::ds::operations::test_and_comparison::{is_same_value_zero, is_strictly_equal};
use crate::runner::ds::operations::type_conversion::{
    relative_index, to_boolean, to_integer_or_infinity, to_number, to_string,
};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::{call_function, describe_value};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Array built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let array = BuiltInObject::new("Array")
        .with_constructor(array_constructor)
        .add_static_method("isArray", array_is_array)
        .add_static_method("from", array_from)
        .add_static_method("of", array_of)
        .add_method("push", array_push)
        .add_method("pop", array_pop)
        .add_method("shift", array_shift)
        .add_method("unshift", array_unshift)
        .add_method("slice", array_slice)
        .add_method("splice", array_splice)
        .add_method("concat", array_concat)
        .add_method("join", array_join)
        .add_method("toString", array_to_string)
        .add_method("reverse", array_reverse)
        .add_method("indexOf", array_index_of)
        .add_method("lastIndexOf", array_last_index_of)
        .add_method("includes", array_includes)
        .add_method("find", array_find)
        .add_method("findIndex", array_find_index)
        .add_method("filter", array_filter)
        .add_method("map", array_map)
        .add_method("forEach", array_for_each)
        .add_method("reduce", array_reduce)
        .add_method("reduceRight", array_reduce_right)
        .add_method("some", array_some)
        .add_method("every", array_every)
        .add_method("sort", array_sort)
        .add_method("fill", array_fill)
        .add_method("flat", array_flat)
        .add_method("flatMap", array_flat_map)
        .add_method("at", array_at)
        .add_method("keys", array_keys)
        .add_method("entries", array_entries);

    registry.register_object(array);
}

fn this_array(this: &JsValue, method: &str) -> Result<JsObjectType, JErrorType> {
    match this {
        JsValue::Object(o) if o.borrow().is_array() => Ok(o.clone()),
        _ => Err(JErrorType::TypeError(format!(
            "Array.prototype.{} called on non-array {}",
            method,
            to_string(this)
        ))),
    }
}

/// Snapshot of the elements.
fn elements(o: &JsObjectType) -> Vec<JsValue> {
    o.borrow().as_array().cloned().unwrap_or_default()
}

fn length(o: &JsObjectType) -> usize {
    o.borrow().as_array().map_or(0, |v| v.len())
}

fn element_at(o: &JsObjectType, i: usize) -> Option<JsValue> {
    o.borrow().as_array().and_then(|v| v.get(i).cloned())
}

/// Runs `f` on the element vector of a non-frozen array.
fn mutate<R>(o: &JsObjectType, f: impl FnOnce(&mut Vec<JsValue>) -> R) -> Result<R, JErrorType> {
    let mut o_mut = o.borrow_mut();
    if !o_mut.extensible {
        let len = o_mut.as_array().map_or(0, |v| v.len());
        return Err(JErrorType::TypeError(format!(
            "Cannot add property {}, object is not extensible",
            len
        )));
    }
    match o_mut.as_array_mut() {
        Some(values) => Ok(f(values)),
        None => Err(JErrorType::TypeError("not an array".to_string())),
    }
}

fn require_callable(f: &JsValue) -> Result<(), JErrorType> {
    if f.is_callable() {
        Ok(())
    } else {
        Err(JErrorType::TypeError(format!("{} is not a function", describe_value(f))))
    }
}

/// Calls `callback(element, index, array)` for each index present when the loop reaches it.
fn for_each_element<F>(
    ctx: &mut EvalContext,
    o: &JsObjectType,
    args: &[JsValue],
    mut visit: F,
) -> Result<(), JErrorType>
where
    F: FnMut(&mut EvalContext, usize, JsValue, JsValue) -> Result<bool, JErrorType>,
{
    let callback = arg(args, 0);
    require_callable(&callback)?;
    let this_arg = arg(args, 1);
    let len = length(o);
    for i in 0..len {
        let element = match element_at(o, i) {
            Some(e) => e,
            None => break,
        };
        let result = call_function(
            ctx,
            &callback,
            this_arg.clone(),
            vec![element.clone(), JsValue::from_i64(i as i64), JsValue::Object(o.clone())],
        )?;
        if !visit(ctx, i, element, result)? {
            break;
        }
    }
    Ok(())
}

/// Array constructor.
fn array_constructor(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    if let [JsValue::Number(n)] = args.as_slice() {
        let len = n.as_f64();
        if !is_valid_array_length(len) {
            return Err(invalid_array_length());
        }
        return Ok(ctx.new_array(vec![JsValue::Undefined; len as usize]));
    }
    Ok(ctx.new_array(args))
}

/// Array.isArray
fn array_is_array(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(match arg(&args, 0) {
        JsValue::Object(o) => o.borrow().is_array(),
        _ => false,
    }))
}

/// Array.from - iterables, or array-likes with a `length`.
fn array_from(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let source = arg(&args, 0);
    let values = match &source {
        JsValue::String(_) => iterate_to_vec(&source, None)?,
        JsValue::Object(o) if o.borrow().is_array() => elements(o),
        JsValue::Object(_) => {
            let len = to_integer_or_infinity(&get_value_property(ctx, &source, "length")?).max(0.0);
            if !is_valid_array_length(len) {
                return Err(invalid_array_length());
            }
            let len = len as usize;
            let mut values = Vec::with_capacity(len);
            for i in 0..len {
                values.push(get_value_property(ctx, &source, &i.to_string())?);
            }
            values
        }
        JsValue::Undefined | JsValue::Null => {
            return Err(JErrorType::TypeError(format!(
                "{} is not iterable (cannot read property Symbol(Symbol.iterator))",
                to_string(&source)
            )))
        }
        _ => vec![],
    };
    let map_fn = arg(&args, 1);
    if map_fn.is_undefined() {
        return Ok(ctx.new_array(values));
    }
    require_callable(&map_fn)?;
    let mut mapped = Vec::with_capacity(values.len());
    for (i, v) in values.into_iter().enumerate() {
        mapped.push(call_function(ctx, &map_fn, JsValue::Undefined, vec![v, JsValue::from_i64(i as i64)])?);
    }
    Ok(ctx.new_array(mapped))
}

/// Array.of
fn array_of(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(ctx.new_array(args))
}

/// Array.prototype.push
fn array_push(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "push")?;
    let len = mutate(&o, |values| {
        values.extend(args);
        values.len()
    })?;
    Ok(JsValue::from_i64(len as i64))
}

/// Array.prototype.pop
fn array_pop(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "pop")?;
    Ok(mutate(&o, |values| values.pop())?.unwrap_or(JsValue::Undefined))
}

/// Array.prototype.shift
fn array_shift(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "shift")?;
    let first = mutate(&o, |values| if values.is_empty() { None } else { Some(values.remove(0)) })?;
    Ok(first.unwrap_or(JsValue::Undefined))
}

/// Array.prototype.unshift
fn array_unshift(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "unshift")?;
    let len = mutate(&o, |values| {
        values.splice(0..0, args);
        values.len()
    })?;
    Ok(JsValue::from_i64(len as i64))
}

/// Array.prototype.slice
fn array_slice(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "slice")?;
    let values = elements(&o);
    let start = relative_index(&arg(&args, 0), values.len(), 0);
    let end = relative_index(&arg(&args, 1), values.len(), values.len());
    let sliced = if start < end { values[start..end].to_vec() } else { vec![] };
    Ok(ctx.new_array(sliced))
}

/// Array.prototype.splice
fn array_splice(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "splice")?;
    let len = length(&o);
    let start = relative_index(&arg(&args, 0), len, 0);
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => (to_integer_or_infinity(&args[1]).max(0.0) as usize).min(len - start),
    };
    let items: Vec<JsValue> = args.iter().skip(2).cloned().collect();
    let removed = mutate(&o, |values| values.splice(start..start + delete_count, items).collect::<Vec<_>>())?;
    Ok(ctx.new_array(removed))
}

/// Array.prototype.concat
fn array_concat(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "concat")?;
    let mut values = elements(&o);
    for a in args {
        match &a {
            JsValue::Object(other) if other.borrow().is_array() => values.extend(elements(other)),
            _ => values.push(a),
        }
    }
    Ok(ctx.new_array(values))
}

fn join(values: &[JsValue], separator: &str) -> String {
    values
        .iter()
        .map(|v| if v.is_nullish() { String::new() } else { to_string(v) })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Array.prototype.join
fn array_join(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "join")?;
    let separator = match arg(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        s => to_string(&s),
    };
    Ok(JsValue::String(join(&elements(&o), &separator)))
}

/// Array.prototype.toString
fn array_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(to_string(&this)))
}

/// Array.prototype.reverse
fn array_reverse(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "reverse")?;
    mutate(&o, |values| values.reverse())?;
    Ok(this)
}

/// Array.prototype.indexOf
fn array_index_of(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "indexOf")?;
    let values = elements(&o);
    let target = arg(&args, 0);
    let from = relative_index(&arg(&args, 1), values.len(), 0);
    let found = values
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, v)| is_strictly_equal(v, &target))
        .map_or(-1, |(i, _)| i as i64);
    Ok(JsValue::from_i64(found))
}

/// Array.prototype.lastIndexOf
fn array_last_index_of(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "lastIndexOf")?;
    let values = elements(&o);
    let target = arg(&args, 0);
    let found = values
        .iter()
        .enumerate()
        .rev()
        .find(|(_, v)| is_strictly_equal(v, &target))
        .map_or(-1, |(i, _)| i as i64);
    Ok(JsValue::from_i64(found))
}

/// Array.prototype.includes
fn array_includes(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "includes")?;
    let values = elements(&o);
    let target = arg(&args, 0);
    let from = relative_index(&arg(&args, 1), values.len(), 0);
    Ok(JsValue::Boolean(values.iter().skip(from).any(|v| is_same_value_zero(v, &target))))
}

/// Array.prototype.find
fn array_find(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "find")?;
    let mut found = JsValue::Undefined;
    for_each_element(ctx, &o, &args, |_, _, element, result| {
        if to_boolean(&result) {
            found = element;
            return Ok(false);
        }
        Ok(true)
    })?;
    Ok(found)
}

/// Array.prototype.findIndex
fn array_find_index(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "findIndex")?;
    let mut found = -1;
    for_each_element(ctx, &o, &args, |_, i, _, result| {
        if to_boolean(&result) {
            found = i as i64;
            return Ok(false);
        }
        Ok(true)
    })?;
    Ok(JsValue::from_i64(found))
}

/// Array.prototype.filter
fn array_filter(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "filter")?;
    let mut kept = vec![];
    for_each_element(ctx, &o, &args, |_, _, element, result| {
        if to_boolean(&result) {
            kept.push(element);
        }
        Ok(true)
    })?;
    Ok(ctx.new_array(kept))
}

/// Array.prototype.map
fn array_map(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "map")?;
    let mut mapped = vec![];
    for_each_element(ctx, &o, &args, |_, _, _, result| {
        mapped.push(result);
        Ok(true)
    })?;
    Ok(ctx.new_array(mapped))
}

/// Array.prototype.forEach
fn array_for_each(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "forEach")?;
    for_each_element(ctx, &o, &args, |_, _, _, _| Ok(true))?;
    Ok(JsValue::Undefined)
}

/// Array.prototype.some
fn array_some(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "some")?;
    let mut any = false;
    for_each_element(ctx, &o, &args, |_, _, _, result| {
        any = to_boolean(&result);
        Ok(!any)
    })?;
    Ok(JsValue::Boolean(any))
}

/// Array.prototype.every
fn array_every(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "every")?;
    let mut all = true;
    for_each_element(ctx, &o, &args, |_, _, _, result| {
        all = to_boolean(&result);
        Ok(all)
    })?;
    Ok(JsValue::Boolean(all))
}

fn reduce(ctx: &mut EvalContext, o: &JsObjectType, args: &[JsValue], from_right: bool) -> Result<JsValue, JErrorType> {
    let callback = arg(args, 0);
    require_callable(&callback)?;
    let len = length(o);
    let mut indices: Vec<usize> = (0..len).collect();
    if from_right {
        indices.reverse();
    }
    let mut indices = indices.into_iter();
    let mut accumulator = if args.len() >= 2 {
        args[1].clone()
    } else {
        match indices.next().and_then(|i| element_at(o, i)) {
            Some(first) => first,
            None => {
                return Err(JErrorType::TypeError(
                    "Reduce of empty array with no initial value".to_string(),
                ))
            }
        }
    };
    for i in indices {
        let element = match element_at(o, i) {
            Some(e) => e,
            None => continue,
        };
        accumulator = call_function(
            ctx,
            &callback,
            JsValue::Undefined,
            vec![accumulator, element, JsValue::from_i64(i as i64), JsValue::Object(o.clone())],
        )?;
    }
    Ok(accumulator)
}

/// Array.prototype.reduce
fn array_reduce(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "reduce")?;
    reduce(ctx, &o, &args, false)
}

/// Array.prototype.reduceRight
fn array_reduce_right(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "reduceRight")?;
    reduce(ctx, &o, &args, true)
}

fn compare_elements(ctx: &mut EvalContext, comparator: &JsValue, a: &JsValue, b: &JsValue) -> Result<Ordering, JErrorType> {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) => return Ok(Ordering::Equal),
        (JsValue::Undefined, _) => return Ok(Ordering::Greater),
        (_, JsValue::Undefined) => return Ok(Ordering::Less),
        _ => {}
    }
    if comparator.is_undefined() {
        let (x, y) = (to_string(a), to_string(b));
        return Ok(x.encode_utf16().cmp(y.encode_utf16()));
    }
    let r = to_number(&call_function(ctx, comparator, JsValue::Undefined, vec![a.clone(), b.clone()])?);
    Ok(if r < 0.0 {
        Ordering::Less
    } else if r > 0.0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    })
}

/// Stable merge sort whose comparator may fail.
fn merge_sort(ctx: &mut EvalContext, comparator: &JsValue, values: Vec<JsValue>) -> Result<Vec<JsValue>, JErrorType> {
    if values.len() <= 1 {
        return Ok(values);
    }
    let mut left = values;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort(ctx, comparator, left)?;
    let right = merge_sort(ctx, comparator, right)?;
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare_elements(ctx, comparator, l, r)? == Ordering::Greater,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        if let Some(v) = next {
            merged.push(v);
        }
    }
    Ok(merged)
}

/// Array.prototype.sort
fn array_sort(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "sort")?;
    let comparator = arg(&args, 0);
    if !comparator.is_undefined() && !comparator.is_callable() {
        return Err(JErrorType::TypeError(
            "The comparison function must be either a function or undefined".to_string(),
        ));
    }
    let sorted = merge_sort(ctx, &comparator, elements(&o))?;
    mutate(&o, |values| *values = sorted)?;
    Ok(this)
}

/// Array.prototype.fill
fn array_fill(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "fill")?;
    let len = length(&o);
    let value = arg(&args, 0);
    let start = relative_index(&arg(&args, 1), len, 0);
    let end = relative_index(&arg(&args, 2), len, len);
    mutate(&o, |values| {
        for slot in values.iter_mut().take(end).skip(start) {
            *slot = value.clone();
        }
    })?;
    Ok(this)
}

fn flatten_into(target: &mut Vec<JsValue>, values: Vec<JsValue>, depth: f64) {
    for v in values {
        let nested = match &v {
            JsValue::Object(o) if depth >= 1.0 => o.borrow().as_array().cloned(),
            _ => None,
        };
        match nested {
            Some(inner) => flatten_into(target, inner, depth - 1.0),
            None => target.push(v),
        }
    }
}

/// Array.prototype.flat
fn array_flat(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "flat")?;
    let depth = match arg(&args, 0) {
        JsValue::Undefined => 1.0,
        d => to_integer_or_infinity(&d),
    };
    let mut flattened = vec![];
    flatten_into(&mut flattened, elements(&o), depth);
    Ok(ctx.new_array(flattened))
}

/// Array.prototype.flatMap
fn array_flat_map(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "flatMap")?;
    let mut mapped = vec![];
    for_each_element(ctx, &o, &args, |_, _, _, result| {
        mapped.push(result);
        Ok(true)
    })?;
    let mut flattened = vec![];
    flatten_into(&mut flattened, mapped, 1.0);
    Ok(ctx.new_array(flattened))
}

/// Array.prototype.at
fn array_at(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "at")?;
    let len = length(&o) as f64;
    let rel = to_integer_or_infinity(&arg(&args, 0));
    let index = if rel < 0.0 { len + rel } else { rel };
    if index < 0.0 || index >= len {
        return Ok(JsValue::Undefined);
    }
    Ok(element_at(&o, index as usize).unwrap_or(JsValue::Undefined))
}

/// Array.prototype.keys - materialized as an array of indices.
fn array_keys(ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "keys")?;
    let keys = (0..length(&o)).map(|i| JsValue::from_i64(i as i64)).collect();
    Ok(ctx.new_array(keys))
}

/// Array.prototype.entries - materialized as an array of `[index, value]` pairs.
fn array_entries(ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = this_array(&this, "entries")?;
    let mut entries = vec![];
    for (i, v) in elements(&o).into_iter().enumerate() {
        entries.push(ctx.new_array(vec![JsValue::from_i64(i as i64), v]));
    }
    Ok(ctx.new_array(entries))
}
