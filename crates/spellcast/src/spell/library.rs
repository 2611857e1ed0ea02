//! Compiling spells and keeping them around.
//!
//! A spell source is a Rhai script whose value, either its final expression
//! or a top-level `return`, is a closure taking `(delta, position,
//! velocity)`:
//!
//! ```text
//! let turns = 0;
//! |d, p, v| {
//!     turns += 1;
//!     p.add_scaled(v, d);
//! }
//! ```
//!
//! The top-level statements form the spell's factory. They run once when the
//! spell is compiled, to check that they work, and once more for every cast,
//! each time in a fresh scope. Variables the closure captures therefore
//! belong to one cast only.

use std::collections::BTreeMap;
use std::rc::Rc;

use glam::Vec3;
use rhai::{AST, Dynamic, Engine, FLOAT, FnPtr, Scope};

use super::engine::{ScriptVec, is_budget_error, sandboxed_engine};
use crate::config::ScriptLimits;
use crate::error::{CompileError, ScriptError};

/// Number of parameters a spell closure takes.
const SPELL_ARITY: usize = 3;

/// Moves straight along the initial velocity.
pub const STRAIGHT: &str = r#"
return |d, p, v| {
    p.x += v.x * d;
    p.y += v.y * d;
};
"#;

/// Wobbles left and right of the aim line.
pub const CURVE: &str = r#"
let age = 0.0;
|d, p, v| {
    age += d;
    v.apply_axis_angle(vec3(0, 0, 1), 0.15 * (age * 6.0).sin());
    p.add_scaled(v, d);
}
"#;

/// Ignores the aim and flies in a random direction picked at cast time.
pub const SCATTER: &str = r#"
let tau = 6.2831853;
let heading = spherical(1, random() * tau, tau / 4.0);
|d, p, v| {
    p.add_scaled(heading, v.length() * d);
}
"#;

/// A compiled spell. Cheap to clone; clones share the compiled script.
#[derive(Clone)]
pub struct Spell {
    name: String,
    source: Rc<str>,
    engine: Rc<Engine>,
    ast: Rc<AST>,
}

impl std::fmt::Debug for Spell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spell").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Spell {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run the factory in a fresh scope and return the closure it produced.
    pub fn instantiate(&self) -> Result<SpellInstance, ScriptError> {
        let tick = run_factory(&self.engine, &self.ast)
            .map_err(|err| ScriptError::Instantiate(err.to_string()))?;
        Ok(SpellInstance {
            engine: Rc::clone(&self.engine),
            ast: Rc::clone(&self.ast),
            tick,
        })
    }
}

/// One cast's closure, with whatever state it captured.
pub struct SpellInstance {
    engine: Rc<Engine>,
    ast: Rc<AST>,
    tick: FnPtr,
}

impl SpellInstance {
    /// Call the closure. Changes the script makes to `position` and
    /// `velocity` are written back only if the call succeeds.
    pub fn invoke(
        &mut self,
        delta: f32,
        position: &mut Vec3,
        velocity: &mut Vec3,
    ) -> Result<(), ScriptError> {
        let p = ScriptVec::new(*position);
        let v = ScriptVec::new(*velocity);
        self.tick
            .call::<Dynamic>(&self.engine, &self.ast, (delta as FLOAT, p.clone(), v.clone()))
            .map_err(|err| {
                if is_budget_error(&err) {
                    ScriptError::Budget
                } else {
                    ScriptError::Runtime(err.to_string())
                }
            })?;
        *position = p.get();
        *velocity = v.get();
        Ok(())
    }
}

/// Evaluate the factory and check its result is a closure of the right
/// arity.
fn run_factory(engine: &Engine, ast: &AST) -> Result<FnPtr, CompileError> {
    let mut scope = Scope::new();
    let value = engine
        .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
        .map_err(|err| CompileError::Setup(err.to_string()))?;
    let type_name = value.type_name();
    let tick = value
        .try_cast::<FnPtr>()
        .ok_or_else(|| CompileError::NotCallable(type_name.to_string()))?;

    // Closures compile to script functions with captured variables curried
    // in front of the declared parameters. Anything else points at a native
    // function whose arity cannot be checked here.
    let def = ast
        .iter_functions()
        .find(|f| f.name == tick.fn_name())
        .ok_or_else(|| CompileError::NotCallable(format!("native {}", tick.fn_name())))?;
    let found = def.params.len().saturating_sub(tick.curry().len());
    if found != SPELL_ARITY {
        return Err(CompileError::Arity { found });
    }
    Ok(tick)
}

/// Named spells plus the engine they compile against.
pub struct SpellLibrary {
    engine: Rc<Engine>,
    spells: BTreeMap<String, Spell>,
}

impl SpellLibrary {
    /// An empty library.
    pub fn new(limits: &ScriptLimits, seed: u64) -> Self {
        Self {
            engine: Rc::new(sandboxed_engine(limits, seed)),
            spells: BTreeMap::new(),
        }
    }

    /// A library holding the `straight`, `curve` and `scatter` spells.
    pub fn with_builtins(limits: &ScriptLimits, seed: u64) -> Self {
        let mut library = Self::new(limits, seed);
        for (name, source) in [("straight", STRAIGHT), ("curve", CURVE), ("scatter", SCATTER)] {
            match library.compile_named(name, source) {
                Ok(spell) => {
                    library.insert(spell);
                }
                Err(err) => log::error!("Built-in spell '{name}' failed to compile: {err}"),
            }
        }
        library
    }

    /// Compile `source` into an unnamed spell.
    pub fn compile(&self, source: &str) -> Result<Spell, CompileError> {
        self.compile_named("untitled", source)
    }

    /// Compile `source`. The factory runs once here; a spell is only
    /// returned if that run yields a three-parameter closure.
    pub fn compile_named(&self, name: &str, source: &str) -> Result<Spell, CompileError> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|err| CompileError::Parse(err.to_string()))?;
        run_factory(&self.engine, &ast)?;
        log::debug!("Compiled spell '{name}'");
        Ok(Spell {
            name: name.to_string(),
            source: Rc::from(source),
            engine: Rc::clone(&self.engine),
            ast: Rc::new(ast),
        })
    }

    /// Store a spell under its name, replacing any previous one.
    pub fn insert(&mut self, spell: Spell) -> Option<Spell> {
        self.spells.insert(spell.name.clone(), spell)
    }

    pub fn get(&self, name: &str) -> Option<&Spell> {
        self.spells.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.spells.keys().map(String::as_str)
    }
}
