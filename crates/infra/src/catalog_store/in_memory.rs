use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::{
    Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::thread::{self, ThreadId};

use chrono::Utc;

use pim_core::{Entity, LocaleId, ProductAbstractId, ProductImageSetId, TaxSetId};
use pim_products::{
    JoinCondition, JoinType, Locale, LocalizedAttributesRow, NewProductAbstractRow, Price,
    ProductAbstractRow, ProductConcrete, ProductImageSet, QueryCriteria, QueryJoin, Relation,
    TaxSet,
};

use super::r#trait::{ProductAbstractStore, SKU_UNIQUE_CONSTRAINT, StoreError, TransactionManager};

/// Every table of the catalog database.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    last_product_abstract_id: i64,
    pub(crate) product_abstracts: BTreeMap<ProductAbstractId, ProductAbstractRow>,
    pub(crate) localized_attributes: BTreeMap<(ProductAbstractId, LocaleId), LocalizedAttributesRow>,
    pub(crate) locales: BTreeMap<LocaleId, Locale>,
    pub(crate) tax_sets: BTreeMap<TaxSetId, TaxSet>,
    pub(crate) prices: BTreeMap<ProductAbstractId, Price>,
    last_image_set_id: i64,
    pub(crate) image_sets: BTreeMap<ProductImageSetId, ProductImageSet>,
    pub(crate) concrete_products: BTreeMap<String, ProductConcrete>,
}

impl Tables {
    fn next_product_abstract_id(&mut self) -> ProductAbstractId {
        self.last_product_abstract_id += 1;
        ProductAbstractId::new(self.last_product_abstract_id)
    }

    pub(crate) fn next_image_set_id(&mut self) -> ProductImageSetId {
        self.last_image_set_id += 1;
        ProductImageSetId::new(self.last_image_set_id)
    }

    pub(crate) fn require_product_abstract(&self, id: ProductAbstractId) -> Result<(), StoreError> {
        if self.product_abstracts.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation(format!(
                "product abstract {id} does not exist"
            )))
        }
    }

    fn sku_taken_by_other(&self, sku: &str, id: Option<ProductAbstractId>) -> bool {
        self.product_abstracts
            .values()
            .any(|row| row.sku == sku && Some(row.id) != id)
    }

    fn join_matches(&self, row: &ProductAbstractRow, join: &QueryJoin) -> bool {
        match join.relation {
            Relation::LocalizedAttributes => self
                .localized_attributes
                .range((row.id, LocaleId::new(i64::MIN))..=(row.id, LocaleId::new(i64::MAX)))
                .any(|((_, locale_id), _)| match join.condition {
                    None => true,
                    Some(JoinCondition::LocaleIs(wanted)) => *locale_id == wanted,
                    Some(JoinCondition::TaxSetIs(_)) => false,
                }),
            Relation::TaxSet => row
                .tax_set_id
                .and_then(|id| self.tax_sets.get(&id))
                .is_some_and(|tax_set| match join.condition {
                    None => true,
                    Some(JoinCondition::TaxSetIs(wanted)) => tax_set.id == wanted,
                    Some(JoinCondition::LocaleIs(_)) => false,
                }),
        }
    }
}

/// An open transaction: the thread that owns it and the state to restore on rollback.
#[derive(Debug)]
struct OpenTransaction {
    owner: ThreadId,
    snapshot: Tables,
}

type TransactionSlot<'a> = MutexGuard<'a, Option<OpenTransaction>>;

/// Write access to the tables.
///
/// Holds the transaction slot as well, so no transaction can open (and take
/// its snapshot) while the write is in progress.
pub(crate) struct TablesWrite<'a> {
    tables: RwLockWriteGuard<'a, Tables>,
    _slot: TransactionSlot<'a>,
}

impl Deref for TablesWrite<'_> {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        &self.tables
    }
}

impl DerefMut for TablesWrite<'_> {
    fn deref_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

/// In-memory catalog database for tests/dev.
///
/// Holds the product abstract tables together with the tables of the price,
/// image, locale and concrete product subsystems, so one transaction covers
/// every write the aggregate writer makes.
///
/// ## Transactions
///
/// - one open transaction at a time; `begin` on another thread blocks until
///   the current one commits or rolls back
/// - `begin` on the thread that already owns the transaction fails with
///   `StoreError::TransactionActive`
/// - rollback restores the snapshot taken at `begin`
///
/// Every write, transactional or not (`insert`, `add_locale`, collaborator
/// writes, ...), waits while another thread holds a transaction, so a rollback
/// only ever discards the owning thread's writes.
///
/// Reads never wait for transactions and see uncommitted writes.
///
/// ## Constraints
///
/// Unique SKUs; localized attributes, prices and image sets must reference an
/// existing product abstract; localized attributes must reference an existing
/// locale. Tax sets are not enforced: a dangling `tax_set_id` simply drops out
/// of the tax-set join.
#[derive(Debug, Default)]
pub struct InMemoryCatalogDatabase {
    tables: RwLock<Tables>,
    transaction: Mutex<Option<OpenTransaction>>,
    transaction_closed: Condvar,
}

impl InMemoryCatalogDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read_tables(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(poisoned)
    }

    pub(crate) fn write_tables(&self) -> Result<TablesWrite<'_>, StoreError> {
        let slot = self.wait_for_slot()?;
        let tables = self.tables.write().map_err(poisoned)?;
        Ok(TablesWrite { tables, _slot: slot })
    }

    /// Lock the transaction slot once no other thread holds a transaction.
    fn wait_for_slot(&self) -> Result<TransactionSlot<'_>, StoreError> {
        let current = thread::current().id();
        let mut slot = self.transaction.lock().map_err(poisoned)?;
        while slot.as_ref().is_some_and(|tx| tx.owner != current) {
            slot = self.transaction_closed.wait(slot).map_err(poisoned)?;
        }
        Ok(slot)
    }

    /// Register a locale (owned by the locale subsystem).
    pub fn add_locale(&self, locale: Locale) -> Result<(), StoreError> {
        self.write_tables()?.locales.insert(locale.id, locale);
        Ok(())
    }

    /// Register a tax set (owned by the tax subsystem).
    pub fn add_tax_set(&self, tax_set: TaxSet) -> Result<(), StoreError> {
        self.write_tables()?.tax_sets.insert(tax_set.id, tax_set);
        Ok(())
    }

    /// Register a concrete product of an existing product abstract.
    pub fn add_concrete_product(&self, concrete: ProductConcrete) -> Result<(), StoreError> {
        let mut tables = self.write_tables()?;
        tables.require_product_abstract(concrete.product_abstract_id)?;
        tables.concrete_products.insert(concrete.sku.clone(), concrete);
        Ok(())
    }

    pub fn product_abstract_count(&self) -> Result<usize, StoreError> {
        Ok(self.read_tables()?.product_abstracts.len())
    }

    pub fn localized_attributes_count(&self) -> Result<usize, StoreError> {
        Ok(self.read_tables()?.localized_attributes.len())
    }

    pub fn price_count(&self) -> Result<usize, StoreError> {
        Ok(self.read_tables()?.prices.len())
    }

    pub fn image_set_count(&self) -> Result<usize, StoreError> {
        Ok(self.read_tables()?.image_sets.len())
    }

    pub fn in_transaction(&self) -> Result<bool, StoreError> {
        Ok(self.transaction.lock().map_err(poisoned)?.is_some())
    }

    /// Close the current thread's transaction, restoring its snapshot when `restore` is set.
    ///
    /// Runs during unwinding too, so poisoned locks are recovered: the snapshot
    /// replaces whatever state the panicking writer left behind.
    fn close_transaction(&self, restore: bool) -> Result<(), StoreError> {
        let mut slot = self.transaction.lock().unwrap_or_else(PoisonError::into_inner);

        let tx = match slot.take() {
            Some(tx) if tx.owner == thread::current().id() => tx,
            other => {
                *slot = other;
                return Err(StoreError::NoTransaction);
            }
        };

        if restore {
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            *tables = tx.snapshot;
            drop(tables);
            self.tables.clear_poison();
        }

        drop(slot);
        self.transaction.clear_poison();
        self.transaction_closed.notify_all();
        Ok(())
    }
}

impl TransactionManager for InMemoryCatalogDatabase {
    fn begin(&self) -> Result<(), StoreError> {
        let mut slot = self.wait_for_slot()?;
        if slot.is_some() {
            return Err(StoreError::TransactionActive);
        }

        let snapshot = self.read_tables()?.clone();
        *slot = Some(OpenTransaction {
            owner: thread::current().id(),
            snapshot,
        });
        Ok(())
    }

    fn commit(&self) -> Result<(), StoreError> {
        self.close_transaction(false)
    }

    fn rollback(&self) -> Result<(), StoreError> {
        self.close_transaction(true)
    }
}

impl ProductAbstractStore for InMemoryCatalogDatabase {
    fn insert(&self, row: NewProductAbstractRow) -> Result<ProductAbstractRow, StoreError> {
        let mut tables = self.write_tables()?;

        if tables.sku_taken_by_other(&row.sku, None) {
            return Err(StoreError::UniqueViolation {
                constraint: SKU_UNIQUE_CONSTRAINT,
                value: row.sku,
            });
        }

        let now = Utc::now();
        let stored = ProductAbstractRow {
            id: tables.next_product_abstract_id(),
            sku: row.sku,
            attributes: row.attributes,
            tax_set_id: row.tax_set_id,
            created_at: now,
            updated_at: now,
        };
        tables.product_abstracts.insert(*stored.id(), stored.clone());
        Ok(stored)
    }

    fn update(
        &self,
        id: ProductAbstractId,
        row: NewProductAbstractRow,
    ) -> Result<ProductAbstractRow, StoreError> {
        let mut tables = self.write_tables()?;

        if tables.sku_taken_by_other(&row.sku, Some(id)) {
            return Err(StoreError::UniqueViolation {
                constraint: SKU_UNIQUE_CONSTRAINT,
                value: row.sku,
            });
        }

        let stored = tables
            .product_abstracts
            .get_mut(&id)
            .ok_or_else(|| StoreError::RowNotFound(format!("product abstract {id}")))?;
        stored.sku = row.sku;
        stored.attributes = row.attributes;
        stored.tax_set_id = row.tax_set_id;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    fn find_by_id(&self, id: ProductAbstractId) -> Result<Option<ProductAbstractRow>, StoreError> {
        Ok(self.read_tables()?.product_abstracts.get(&id).cloned())
    }

    fn find_by_sku(&self, sku: &str) -> Result<Option<ProductAbstractRow>, StoreError> {
        Ok(self
            .read_tables()?
            .product_abstracts
            .values()
            .find(|row| row.sku == sku)
            .cloned())
    }

    fn upsert_localized_attributes(&self, row: LocalizedAttributesRow) -> Result<(), StoreError> {
        let mut tables = self.write_tables()?;
        tables.require_product_abstract(row.product_abstract_id)?;
        if !tables.locales.contains_key(&row.locale_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "locale {} does not exist",
                row.locale_id
            )));
        }

        tables
            .localized_attributes
            .insert((row.product_abstract_id, row.locale_id), row);
        Ok(())
    }

    fn localized_attributes(
        &self,
        id: ProductAbstractId,
    ) -> Result<Vec<LocalizedAttributesRow>, StoreError> {
        let tables = self.read_tables()?;
        Ok(tables
            .localized_attributes
            .range((id, LocaleId::new(i64::MIN))..=(id, LocaleId::new(i64::MAX)))
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn tax_set_for(&self, id: ProductAbstractId) -> Result<Option<TaxSet>, StoreError> {
        let tables = self.read_tables()?;
        Ok(tables
            .product_abstracts
            .get(&id)
            .and_then(|row| row.tax_set_id)
            .and_then(|tax_set_id| tables.tax_sets.get(&tax_set_id))
            .cloned())
    }

    fn query(&self, criteria: &QueryCriteria) -> Result<Vec<ProductAbstractRow>, StoreError> {
        let tables = self.read_tables()?;

        let matching = tables
            .product_abstracts
            .values()
            .filter(|row| {
                criteria
                    .sku_prefix
                    .as_deref()
                    .is_none_or(|prefix| row.sku.starts_with(prefix))
            })
            .filter(|row| {
                criteria
                    .joins
                    .iter()
                    .filter(|join| join.join_type == JoinType::Inner)
                    .all(|join| tables.join_matches(row, join))
            })
            .take(criteria.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(matching)
    }
}
