//! Shared destination handle

use crate::context::EvalContext;
use crate::expr::IntoExpr;
use alinea_core::{
    AlineaError, Density, Kind, Operand, Orientation, Result, Shape, StorageId,
};
use alinea_storage::Store;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// A vector or matrix that can appear on both sides of an assignment
///
/// Expressions borrow a `Var` immutably, so `v.assign(&v + &w)` is
/// accepted by the borrow checker; the engine decides at runtime whether
/// the write can go straight into the storage or needs a temporary.
/// Cloning a `Var` shares the storage, so a clone aliases the original.
pub struct Var<C> {
    cell: Rc<RefCell<C>>,
}

impl<C> Var<C> {
    pub fn new(value: C) -> Self {
        Self { cell: Rc::new(RefCell::new(value)) }
    }

    /// Identity of the underlying storage
    pub fn id(&self) -> StorageId {
        StorageId::of(Rc::as_ptr(&self.cell))
    }

    /// Read access to the container
    ///
    /// Any assignment to this `Var` fails while the guard is alive.
    pub fn borrow(&self) -> Ref<'_, C> {
        self.cell.borrow()
    }

    pub(crate) fn try_borrow_mut(&self) -> Result<RefMut<'_, C>> {
        self.cell.try_borrow_mut().map_err(|_| {
            AlineaError::invalid_argument("destination is borrowed elsewhere")
                .with_suggestion("Drop guards returned by Var::borrow before assigning")
        })
    }

    /// Whether both handles share one storage
    pub fn same_storage(&self, other: &Var<C>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<C: Clone> Var<C> {
    /// Copy of the current contents
    pub fn snapshot(&self) -> C {
        self.cell.borrow().clone()
    }
}

impl<C> Clone for Var<C> {
    fn clone(&self) -> Self {
        Self { cell: Rc::clone(&self.cell) }
    }
}

impl<C> From<C> for Var<C> {
    fn from(value: C) -> Self {
        Self::new(value)
    }
}

impl<C: fmt::Debug> fmt::Debug for Var<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Var").field(&*self.cell.borrow()).finish()
    }
}

impl<C: fmt::Display> fmt::Display for Var<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cell.borrow().fmt(f)
    }
}

impl<C: Operand> Operand for Var<C> {
    type Elem = C::Elem;

    fn shape(&self) -> Shape {
        self.cell.borrow().shape()
    }

    fn orientation(&self) -> Orientation {
        self.cell.borrow().orientation()
    }

    fn density(&self) -> Density {
        self.cell.borrow().density()
    }

    fn kind(&self) -> Kind {
        self.cell.borrow().kind()
    }

    fn get(&self, row: usize, col: usize) -> C::Elem {
        self.cell.borrow().get(row, col)
    }

    fn line(&self, major: usize, order: Orientation, out: &mut Vec<(usize, C::Elem)>) {
        self.cell.borrow().line(major, order, out)
    }

    fn nnz(&self) -> usize {
        self.cell.borrow().nnz()
    }

    fn storage_id(&self) -> Option<StorageId> {
        Some(self.id())
    }
}

impl<C: Store> Var<C> {
    /// `self = expr`
    pub fn assign<'a>(&self, expr: impl IntoExpr<'a, C::Elem>) -> Result<()>
    where
        C: 'a,
    {
        EvalContext::default().assign(self, expr)
    }

    /// `self += expr`
    pub fn add_assign<'a>(&self, expr: impl IntoExpr<'a, C::Elem>) -> Result<()>
    where
        C: 'a,
    {
        EvalContext::default().add_assign(self, expr)
    }

    /// `self -= expr`
    pub fn sub_assign<'a>(&self, expr: impl IntoExpr<'a, C::Elem>) -> Result<()>
    where
        C: 'a,
    {
        EvalContext::default().sub_assign(self, expr)
    }

    /// `self *= expr`: component-wise for two vectors, scaling for a scalar
    /// expression, a product otherwise
    pub fn mul_assign<'a>(&self, expr: impl IntoExpr<'a, C::Elem>) -> Result<()>
    where
        C: 'a,
    {
        EvalContext::default().mul_assign(self, expr)
    }

    /// `self *= s`
    pub fn scale_assign(&self, s: C::Elem) -> Result<()> {
        EvalContext::default().scale_assign(self, s)
    }
}
