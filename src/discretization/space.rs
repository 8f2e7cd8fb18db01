use std::sync::Arc;

use crate::error::{BoundaryError, Result};

/// Field identifier stored as a runtime string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field(pub Arc<str>);

impl Field {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }
}

impl<T: Into<Arc<str>>> From<T> for Field {
    fn from(name: T) -> Self {
        Field::new(name)
    }
}

/// Discrete function space with one unknown per field and cell.
/// A single-field space has no sub-spaces.
#[derive(Clone, Debug)]
pub struct FunctionSpace {
    fields: Vec<Field>,
}

/// Target of an essential constraint: the whole space or one sub-component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubSpace {
    Whole,
    Component(usize),
}

impl SubSpace {
    /// Offset of the constrained unknown inside a cell block.
    pub fn component(&self) -> usize {
        match self {
            SubSpace::Whole => 0,
            SubSpace::Component(i) => *i,
        }
    }
}

impl FunctionSpace {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn scalar(field: impl Into<Field>) -> Self {
        Self::new(vec![field.into()])
    }

    pub fn num_vars(&self) -> usize {
        self.fields.len()
    }

    pub fn num_sub_spaces(&self) -> usize {
        if self.fields.len() > 1 {
            self.fields.len()
        } else {
            0
        }
    }

    pub fn sub(&self, component: usize) -> Result<SubSpace> {
        if component < self.fields.len() {
            Ok(SubSpace::Component(component))
        } else {
            Err(BoundaryError::InvalidConfiguration(format!(
                "component {component} out of range for a space with {} fields",
                self.fields.len()
            )))
        }
    }

    /// Sub-space selection: the whole space when there are no sub-components.
    pub fn select(&self, component: usize) -> Result<SubSpace> {
        if self.num_sub_spaces() == 0 {
            if component != 0 {
                return self.sub(component);
            }
            Ok(SubSpace::Whole)
        } else {
            self.sub(component)
        }
    }
}
