//! The sandboxed Rhai engine spells run in.
//!
//! Scripts get the core language, basic math and a small vector API. There is
//! no module resolver, `eval` is disabled, `print`/`debug` go to the log, and
//! every run is bounded by [`ScriptLimits`].
//!
//! ## Vector API
//!
//! | Script                         | Effect                                  |
//! |--------------------------------|-----------------------------------------|
//! | `vec3(x, y, z)`                | new vector                              |
//! | `spherical(r, phi, theta)`     | new vector from spherical coordinates   |
//! | `v.x`, `v.y`, `v.z`            | read / write a component                |
//! | `v.add(o)`, `v.sub(o)`         | in place, returns `v`                   |
//! | `v.scale(s)`                   | in place, returns `v`                   |
//! | `v.add_scaled(o, s)`           | `v += o * s`, returns `v`               |
//! | `v.normalize()`                | in place, returns `v`                   |
//! | `v.apply_axis_angle(axis, a)`  | rotate in place, returns `v`            |
//! | `v.set(x, y, z)`, `v.copy(o)`  | overwrite in place, returns `v`         |
//! | `v.length()`, `v.dot(o)`       | numbers                                 |
//! | `v.distance_to(o)`             | number                                  |
//! | `v.clone()`                    | independent copy                        |
//! | `a + b`, `a - b`, `a * s`      | new vectors                             |
//! | `random()`                     | number in `[0, 1)`                      |
//!
//! Vectors are shared handles: assigning one to another variable, or
//! mutating a parameter, changes the same vector the host sees.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rhai::packages::{BasicMathPackage, CorePackage, Package};
use rhai::{Dynamic, Engine, EvalAltResult, FLOAT, INT};

use crate::config::ScriptLimits;
use crate::math::from_spherical;

/// A 3D vector as seen by scripts.
#[derive(Clone, Default)]
pub struct ScriptVec(Rc<RefCell<Vec3>>);

impl ScriptVec {
    pub fn new(v: Vec3) -> Self {
        Self(Rc::new(RefCell::new(v)))
    }

    pub fn get(&self) -> Vec3 {
        *self.0.borrow()
    }

    pub fn set(&self, v: Vec3) {
        *self.0.borrow_mut() = v;
    }

    fn update(&self, f: impl FnOnce(&mut Vec3)) {
        f(&mut self.0.borrow_mut());
    }
}

impl fmt::Debug for ScriptVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.get();
        write!(f, "vec3({}, {}, {})", v.x, v.y, v.z)
    }
}

type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

/// Accept both integer and float script numbers.
fn number(value: Dynamic) -> ScriptResult<FLOAT> {
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    match value.as_int() {
        Ok(i) => Ok(i as FLOAT),
        Err(found) => Err(format!("expected a number, got {found}").into()),
    }
}

/// Build the engine every spell compiles and runs against.
pub fn sandboxed_engine(limits: &ScriptLimits, seed: u64) -> Engine {
    let mut engine = Engine::new_raw();
    engine.register_global_module(CorePackage::new().as_shared_module());
    engine.register_global_module(BasicMathPackage::new().as_shared_module());

    engine.set_max_operations(limits.max_operations);
    engine.set_max_call_levels(limits.max_call_levels);
    engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
    engine.set_max_string_size(limits.max_string_size);
    engine.set_max_array_size(limits.max_array_size);
    engine.set_max_map_size(limits.max_map_size);
    engine.disable_symbol("eval");

    engine.on_print(|text| log::info!(target: "spell", "{text}"));
    engine.on_debug(|text, source, pos| match source {
        Some(source) => log::debug!(target: "spell", "{source} @ {pos:?} | {text}"),
        None => log::debug!(target: "spell", "{pos:?} | {text}"),
    });

    register_vector_api(&mut engine);

    let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(seed)));
    engine.register_fn("random", move || -> FLOAT { rng.borrow_mut().gen_range(0.0..1.0) });

    engine
}

fn register_vector_api(engine: &mut Engine) {
    engine.register_type_with_name::<ScriptVec>("Vec3");

    engine.register_fn(
        "vec3",
        |x: Dynamic, y: Dynamic, z: Dynamic| -> ScriptResult<ScriptVec> {
            Ok(ScriptVec::new(Vec3::new(number(x)?, number(y)?, number(z)?)))
        },
    );
    engine.register_fn(
        "spherical",
        |radius: Dynamic, phi: Dynamic, theta: Dynamic| -> ScriptResult<ScriptVec> {
            let v = from_spherical(number(radius)?, number(phi)?, number(theta)?);
            Ok(ScriptVec::new(v))
        },
    );

    for (name, axis) in [("x", 0usize), ("y", 1), ("z", 2)] {
        engine.register_get_set(
            name,
            move |v: &mut ScriptVec| -> FLOAT { v.get()[axis] },
            move |v: &mut ScriptVec, value: FLOAT| v.update(|p| p[axis] = value),
        );
        engine.register_set(name, move |v: &mut ScriptVec, value: INT| {
            v.update(|p| p[axis] = value as FLOAT)
        });
    }

    engine.register_fn("add", |v: &mut ScriptVec, other: ScriptVec| {
        let o = other.get();
        v.update(|p| *p += o);
        v.clone()
    });
    engine.register_fn("sub", |v: &mut ScriptVec, other: ScriptVec| {
        let o = other.get();
        v.update(|p| *p -= o);
        v.clone()
    });
    engine.register_fn("scale", |v: &mut ScriptVec, s: Dynamic| -> ScriptResult<ScriptVec> {
        let s = number(s)?;
        v.update(|p| *p *= s);
        Ok(v.clone())
    });
    engine.register_fn(
        "add_scaled",
        |v: &mut ScriptVec, other: ScriptVec, s: Dynamic| -> ScriptResult<ScriptVec> {
            let delta = other.get() * number(s)?;
            v.update(|p| *p += delta);
            Ok(v.clone())
        },
    );
    engine.register_fn("normalize", |v: &mut ScriptVec| {
        v.update(|p| *p = p.normalize_or_zero());
        v.clone()
    });
    engine.register_fn(
        "apply_axis_angle",
        |v: &mut ScriptVec, axis: ScriptVec, angle: Dynamic| -> ScriptResult<ScriptVec> {
            let angle = number(angle)?;
            let axis = axis.get().normalize_or_zero();
            if axis != Vec3::ZERO {
                let rotation = Quat::from_axis_angle(axis, angle);
                v.update(|p| *p = rotation * *p);
            }
            Ok(v.clone())
        },
    );
    engine.register_fn(
        "set",
        |v: &mut ScriptVec, x: Dynamic, y: Dynamic, z: Dynamic| -> ScriptResult<ScriptVec> {
            let new = Vec3::new(number(x)?, number(y)?, number(z)?);
            v.set(new);
            Ok(v.clone())
        },
    );
    engine.register_fn("copy", |v: &mut ScriptVec, other: ScriptVec| {
        let o = other.get();
        v.set(o);
        v.clone()
    });
    engine.register_fn("clone", |v: &mut ScriptVec| ScriptVec::new(v.get()));
    engine.register_fn("length", |v: &mut ScriptVec| -> FLOAT { v.get().length() });
    engine.register_fn("dot", |v: &mut ScriptVec, other: ScriptVec| -> FLOAT {
        v.get().dot(other.get())
    });
    engine.register_fn("distance_to", |v: &mut ScriptVec, other: ScriptVec| -> FLOAT {
        v.get().distance(other.get())
    });

    engine.register_fn("+", |a: ScriptVec, b: ScriptVec| ScriptVec::new(a.get() + b.get()));
    engine.register_fn("-", |a: ScriptVec, b: ScriptVec| ScriptVec::new(a.get() - b.get()));
    engine.register_fn("-", |a: ScriptVec| ScriptVec::new(-a.get()));
    engine.register_fn("*", |a: ScriptVec, s: FLOAT| ScriptVec::new(a.get() * s));
    engine.register_fn("*", |a: ScriptVec, s: INT| ScriptVec::new(a.get() * s as FLOAT));
    engine.register_fn("*", |s: FLOAT, a: ScriptVec| ScriptVec::new(a.get() * s));

    engine.register_fn("to_string", |v: &mut ScriptVec| format!("{v:?}"));
    engine.register_fn("to_debug", |v: &mut ScriptVec| format!("{v:?}"));
}

/// `true` when the error, or the error it wraps, is an exhausted operation
/// budget.
pub(crate) fn is_budget_error(err: &EvalAltResult) -> bool {
    match err {
        EvalAltResult::ErrorTooManyOperations(_) => true,
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => is_budget_error(inner),
        _ => false,
    }
}
