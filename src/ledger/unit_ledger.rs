// Unit Ledger - current unit state over a store

use crate::error::LedgerError;
use crate::identity::{Address, UnitId};
use crate::ledger::Unit;
use crate::storage::{LedgerStore, Statement, WriteBatch};
use std::sync::Arc;
use tracing::debug;

/// Owns the set of units and their existence, ownership and spent checks
#[derive(Clone)]
pub struct UnitLedger {
    store: Arc<dyn LedgerStore>,
}

impl UnitLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Load a unit, failing with `NotFound` if absent
    pub fn get(&self, id: &UnitId) -> Result<Unit, LedgerError> {
        self.find(id)?.ok_or(LedgerError::NotFound(*id))
    }

    /// Load a unit if it exists
    pub fn find(&self, id: &UnitId) -> Result<Option<Unit>, LedgerError> {
        Ok(self.store.get_unit(id)?)
    }

    /// Insert a new unit. Fails with `DuplicateId` if the id is taken.
    pub fn create(&self, unit: Unit) -> Result<(), LedgerError> {
        let id = *unit.id();
        self.store
            .execute(&WriteBatch::new().with(Statement::CreateUnit(unit)))?;
        debug!(unit = %id, "unit created");
        Ok(())
    }

    /// Tombstone a unit. A unit that is already deleted stays deleted.
    pub fn mark_deleted(&self, id: &UnitId) -> Result<(), LedgerError> {
        self.store.execute(&WriteBatch::new().with(Statement::MarkDeleted {
            id: *id,
            expect_live: false,
        }))?;
        Ok(())
    }

    /// Flag a unit as withdrawn
    pub fn mark_withdrawn(&self, id: &UnitId) -> Result<(), LedgerError> {
        self.store
            .execute(&WriteBatch::new().with(Statement::MarkWithdrawn(*id)))?;
        Ok(())
    }

    /// Spendable units held by `owner`
    pub fn list_by_owner(&self, owner: &Address) -> Result<Vec<Unit>, LedgerError> {
        let units: Vec<Unit> = self
            .store
            .units_by_owner(owner)?
            .into_iter()
            .filter(Unit::is_spendable)
            .collect();
        debug!(owner = %owner, count = units.len(), "listed units");
        Ok(units)
    }

    /// Total spendable value held by `owner`
    pub fn balance_of(&self, owner: &Address) -> Result<u64, LedgerError> {
        Ok(self
            .list_by_owner(owner)?
            .iter()
            .fold(0u64, |acc, u| acc.saturating_add(u.value())))
    }
}
