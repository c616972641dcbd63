use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Result, SalixError};
use crate::value::Value;

/// One frame of the lexical environment chain.  Frames are shared:
/// every closure declared in a scope holds the same `Rc` and observes
/// later assignments through it.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Unconditional insert.  Redefinition is allowed here; non-global
    /// scopes are protected from it earlier, at resolution.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined_variable(name, line))
        }
    }

    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);

            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined_variable(name, line))
        }
    }

    /// Read `name` exactly `distance` frames up the chain, with no
    /// outward fallback.  The resolution pass guarantees the binding is
    /// there.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        let frame = Environment::ancestor(env, distance, name, line)?;

        let value = frame.borrow().values.get(name).cloned();

        value.ok_or_else(|| undefined_variable(name, line))
    }

    /// Write `name` exactly `distance` frames up the chain.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let frame = Environment::ancestor(env, distance, name, line)?;

        frame.borrow_mut().values.insert(name.to_string(), value);

        Ok(())
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Rc<RefCell<Environment>>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let enclosing = frame.borrow().enclosing.clone();

            frame = enclosing.ok_or_else(|| undefined_variable(name, line))?;
        }

        Ok(frame)
    }
}

fn undefined_variable(name: &str, line: usize) -> SalixError {
    SalixError::runtime(line, format!("Undefined variable '{}'.", name))
}
