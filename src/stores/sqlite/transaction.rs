//! Implements a SQLite backed transaction store.
//!
//! This is the write path of the ledger: [SQLiteTransactionStore::create]
//! persists a transaction, its entries, its evidence links and the matching
//! balance cache rows in one SQL transaction, so concurrent writers and
//! crashes can never observe a half-posted transaction or a stale balance.
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use rusqlite::{
    Connection, Transaction as SqlTransaction, TransactionBehavior, named_params,
    params_from_iter, types::Value,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    Error,
    db::MapRow,
    models::{
        DatabaseID, EntityRef, LedgerEntry, Transaction, TransactionBuilder, TransactionKind,
    },
    stores::{MatchType, TransactionQuery, TransactionStore},
};

/// Stores transactions in a SQLite database.
///
/// Note that entries post against [Ledger](crate::models::Ledger) rows, so
/// the referenced ledgers must exist before a transaction is created.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let connection = self
            .connection
            .lock()
            .expect("could not acquire database lock");

        // An immediate transaction takes the write lock up front, so the
        // read-modify-write balance upserts below cannot race another
        // writer between miss and insert.
        let tx = SqlTransaction::new_unchecked(&connection, TransactionBehavior::Immediate)?;

        // Lock every referenced ledger in ascending id order. The canonical
        // order keeps lock acquisition consistent across concurrent callers
        // on storage engines with row-level locks, and verifies that each
        // ledger exists.
        let mut ledger_ids: Vec<DatabaseID> =
            builder.entries.iter().map(LedgerEntry::ledger_id).collect();
        ledger_ids.sort_unstable();
        ledger_ids.dedup();

        {
            let mut statement = tx.prepare("SELECT id FROM ledger WHERE id = :id")?;

            for ledger_id in &ledger_ids {
                statement
                    .query_row(&[(":id", ledger_id)], |_| Ok(()))
                    .map_err(|error| match error {
                        rusqlite::Error::QueryReturnedNoRows => Error::InvalidLedger(*ledger_id),
                        error => error.into(),
                    })?;
            }
        }

        validate_entries(&builder.entries)?;

        let kind = match &builder.kind {
            Some(name) => get_or_create_kind_on(&tx, name, "")?,
            None => get_or_create_kind_on(
                &tx,
                TransactionKind::MANUAL,
                "Transactions posted without an explicit kind",
            )?,
        };

        let posted_at = builder.posted_at.unwrap_or_else(OffsetDateTime::now_utc);
        let created_at = OffsetDateTime::now_utc();

        let posted = tx
            .prepare(
                "INSERT INTO \"transaction\"
                 (transaction_uuid, notes, created_by, kind_id, posted_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING id, transaction_uuid, notes, created_by, kind_id, posted_at, created_at",
            )?
            .query_row(
                (
                    Uuid::new_v4(),
                    &builder.notes,
                    builder.created_by,
                    kind.id(),
                    posted_at,
                    created_at,
                ),
                Transaction::map_row,
            )?;

        let evidence = dedup_evidence(&builder.evidence);

        // The critical section: increment the balance row for every
        // (ledger, evidence) pair, creating it on first touch. Covered by
        // the write lock taken above.
        {
            let mut update = tx.prepare(
                "UPDATE ledger_balance
                 SET balance = balance + :amount, modified_at = :now
                 WHERE ledger_id = :ledger_id
                 AND entity_type = :entity_type AND entity_id = :entity_id",
            )?;
            let mut insert = tx.prepare(
                "INSERT INTO ledger_balance
                 (ledger_id, entity_type, entity_id, balance, created_at, modified_at)
                 VALUES (:ledger_id, :entity_type, :entity_id, :amount, :now, :now)",
            )?;

            for entry in &builder.entries {
                for entity in &evidence {
                    let updated = update.execute(named_params! {
                        ":amount": entry.amount(),
                        ":now": created_at,
                        ":ledger_id": entry.ledger_id(),
                        ":entity_type": entity.entity_type(),
                        ":entity_id": entity.entity_id(),
                    })?;

                    match updated {
                        0 => {
                            insert.execute(named_params! {
                                ":ledger_id": entry.ledger_id(),
                                ":entity_type": entity.entity_type(),
                                ":entity_id": entity.entity_id(),
                                ":amount": entry.amount(),
                                ":now": created_at,
                            })?;
                        }
                        1 => {}
                        _ => return Err(Error::CorruptBalanceCache),
                    }
                }
            }
        }

        let mut entries = Vec::with_capacity(builder.entries.len());
        {
            let mut statement = tx.prepare(
                "INSERT INTO ledger_entry
                 (entry_uuid, ledger_id, transaction_id, amount, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING id, entry_uuid, ledger_id, transaction_id, amount, created_at",
            )?;

            for entry in &builder.entries {
                entries.push(statement.query_row(
                    (
                        entry.entry_uuid(),
                        entry.ledger_id(),
                        posted.id(),
                        entry.amount(),
                        created_at,
                    ),
                    LedgerEntry::map_row,
                )?);
            }
        }

        // One evidence link per distinct object, independent of entry count.
        {
            let mut statement = tx.prepare(
                "INSERT INTO transaction_evidence
                 (transaction_id, entity_type, entity_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for entity in &evidence {
                statement.execute((
                    posted.id(),
                    entity.entity_type(),
                    entity.entity_id(),
                    created_at,
                ))?;
            }
        }

        tx.commit()?;

        tracing::debug!(
            transaction_id = posted.id(),
            entries = entries.len(),
            evidence = evidence.len(),
            "posted ledger transaction"
        );

        Ok(posted.attach_details(entries, evidence))
    }

    fn get(&self, id: DatabaseID) -> Result<Transaction, Error> {
        let connection = self
            .connection
            .lock()
            .expect("could not acquire database lock");

        let transaction = connection
            .prepare(
                "SELECT id, transaction_uuid, notes, created_by, kind_id, posted_at, created_at
                 FROM \"transaction\" WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], Transaction::map_row)?;

        attach_details(&connection, transaction)
    }

    fn get_query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error> {
        let connection = self
            .connection
            .lock()
            .expect("could not acquire database lock");

        let evidence = dedup_evidence(&query.evidence);

        let mut query_string_parts = vec![
            "SELECT id, transaction_uuid, notes, created_by, kind_id, posted_at, created_at
             FROM \"transaction\""
                .to_string(),
        ];
        let mut where_clause_parts = vec![];
        let mut query_parameters = vec![];

        match query.match_type {
            MatchType::Any => {
                let predicates: Vec<String> = evidence
                    .iter()
                    .map(|entity| membership_predicate(&mut query_parameters, entity))
                    .collect();

                if !predicates.is_empty() {
                    where_clause_parts.push(format!("({})", predicates.join(" OR ")));
                }
            }
            // Each additional evidence object narrows the candidates with
            // its own membership predicate; supersets still match. Exact
            // narrows the same way and is finished off below.
            MatchType::All | MatchType::Exact => {
                for entity in &evidence {
                    where_clause_parts.push(membership_predicate(&mut query_parameters, entity));
                }
            }
            MatchType::None => {
                for entity in &evidence {
                    where_clause_parts.push(format!(
                        "NOT {}",
                        membership_predicate(&mut query_parameters, entity)
                    ));
                }
            }
        }

        if !where_clause_parts.is_empty() {
            query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));
        }

        query_string_parts.push("ORDER BY id ASC".to_string());

        if let Some(limit) = query.limit {
            query_string_parts.push(format!("LIMIT {limit} OFFSET {}", query.offset));
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        let transactions = connection
            .prepare(&query_string)?
            .query_map(params, Transaction::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect::<Result<Vec<_>, _>>()?;

        let requested: HashSet<&EntityRef> = evidence.iter().collect();
        let mut results = Vec::with_capacity(transactions.len());

        for transaction in transactions {
            let transaction = attach_details(&connection, transaction)?;

            // Exact: the candidates matched every requested object; keep
            // only those whose full evidence set equals the request.
            if query.match_type == MatchType::Exact {
                let linked: HashSet<&EntityRef> = transaction.evidence().iter().collect();

                if linked != requested {
                    continue;
                }
            }

            results.push(transaction);
        }

        Ok(results)
    }

    fn entries_for_ledger(&self, ledger_id: DatabaseID) -> Result<Vec<LedgerEntry>, Error> {
        self.connection
            .lock()
            .expect("could not acquire database lock")
            .prepare(
                "SELECT id, entry_uuid, ledger_id, transaction_id, amount, created_at
                 FROM ledger_entry WHERE ledger_id = :ledger_id ORDER BY id",
            )?
            .query_map(&[(":ledger_id", &ledger_id)], LedgerEntry::map_row)?
            .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
            .collect()
    }

    fn count(&self) -> Result<usize, Error> {
        self.connection
            .lock()
            .expect("could not acquire database lock")
            .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|count| count as usize)
            .map_err(|error| error.into())
    }

    fn get_or_create_kind(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<TransactionKind, Error> {
        let connection = self
            .connection
            .lock()
            .expect("could not acquire database lock");

        get_or_create_kind_on(&connection, name, description)
    }

    fn get_kind(&self, id: DatabaseID) -> Result<TransactionKind, Error> {
        let kind = self
            .connection
            .lock()
            .expect("could not acquire database lock")
            .prepare("SELECT id, name, description FROM transaction_kind WHERE id = :id")?
            .query_row(&[(":id", &id)], TransactionKind::map_row)?;

        Ok(kind)
    }
}

/// Reject entry lists that would corrupt the ledger. Runs before any row is
/// written.
fn validate_entries(entries: &[LedgerEntry]) -> Result<(), Error> {
    if entries.is_empty() {
        return Err(Error::NoLedgerEntries);
    }

    if let Some(id) = entries.iter().find_map(LedgerEntry::id) {
        return Err(Error::ExistingLedgerEntry(id));
    }

    let total: i128 = entries.iter().map(|entry| i128::from(entry.amount())).sum();

    if total != 0 {
        return Err(Error::UnbalancedEntries(total));
    }

    Ok(())
}

fn dedup_evidence(evidence: &[EntityRef]) -> Vec<EntityRef> {
    let mut deduplicated: Vec<EntityRef> = Vec::with_capacity(evidence.len());

    for entity in evidence {
        if !deduplicated.contains(entity) {
            deduplicated.push(entity.clone());
        }
    }

    deduplicated
}

/// Append a membership predicate for `entity` and its query parameters.
///
/// The returned SQL matches transactions with an evidence link to `entity`.
fn membership_predicate(parameters: &mut Vec<Value>, entity: &EntityRef) -> String {
    parameters.push(Value::Text(entity.entity_type().to_owned()));
    parameters.push(Value::Integer(entity.entity_id()));

    format!(
        "EXISTS (SELECT 1 FROM transaction_evidence e \
         WHERE e.transaction_id = \"transaction\".id \
         AND e.entity_type = ?{} AND e.entity_id = ?{})",
        parameters.len() - 1,
        parameters.len(),
    )
}

fn get_or_create_kind_on(
    connection: &Connection,
    name: &str,
    description: &str,
) -> Result<TransactionKind, Error> {
    let existing = connection
        .prepare("SELECT id, name, description FROM transaction_kind WHERE name = :name")?
        .query_row(&[(":name", name)], TransactionKind::map_row);

    match existing {
        Ok(kind) => Ok(kind),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            let kind = connection
                .prepare(
                    "INSERT INTO transaction_kind (name, description)
                     VALUES (?1, ?2)
                     RETURNING id, name, description",
                )?
                .query_row((name, description), TransactionKind::map_row)?;

            Ok(kind)
        }
        Err(error) => Err(error.into()),
    }
}

fn attach_details(connection: &Connection, transaction: Transaction) -> Result<Transaction, Error> {
    let entries = connection
        .prepare(
            "SELECT id, entry_uuid, ledger_id, transaction_id, amount, created_at
             FROM ledger_entry WHERE transaction_id = :id ORDER BY id",
        )?
        .query_map(&[(":id", &transaction.id())], LedgerEntry::map_row)?
        .map(|maybe_entry| maybe_entry.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    let evidence = connection
        .prepare(
            "SELECT entity_type, entity_id FROM transaction_evidence
             WHERE transaction_id = :id ORDER BY id",
        )?
        .query_map(&[(":id", &transaction.id())], EntityRef::map_row)?
        .map(|maybe_entity| maybe_entity.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transaction.attach_details(entries, evidence))
}

#[cfg(test)]
mod sqlite_transaction_store_tests {
    use proptest::prelude::*;
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error, credit, debit,
        models::{DatabaseID, EntityRef, Ledger, Transaction, TransactionBuilder, TransactionKind},
        stores::{
            BalanceStore, LedgerStore, MatchType, TransactionQuery, TransactionStore,
            sqlite::{LedgerStores, create_ledger_stores},
        },
    };

    fn get_test_stores() -> LedgerStores {
        create_ledger_stores(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn get_test_ledgers(stores: &mut LedgerStores) -> (Ledger, Ledger) {
        let receivable = stores
            .ledgers
            .create("Accounts Receivable", 1100, false, "")
            .unwrap();
        let revenue = stores.ledgers.create("Revenue", 4000, true, "").unwrap();

        (receivable, revenue)
    }

    fn transaction_ids(transactions: &[Transaction]) -> Vec<DatabaseID> {
        let mut ids: Vec<DatabaseID> = transactions
            .iter()
            .map(|transaction| transaction.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn create_balanced_transaction_succeeds() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);

        let posted = stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(100))
                    .entry(revenue.id(), credit(100))
                    .notes("invoice #42"),
            )
            .expect("could not post transaction");

        assert_eq!(stores.transactions.count(), Ok(1));
        assert_eq!(posted.entries().len(), 2);
        assert_eq!(posted.notes(), "invoice #42");
        assert_eq!(posted.created_by(), 1);
        assert!(posted.evidence().is_empty());
        assert_eq!(posted.validate(), Ok(()));

        assert_eq!(stores.ledgers.balance(receivable.id()), Ok(100));
        assert_eq!(stores.ledgers.balance(revenue.id()), Ok(-100));

        let receivable_entries = stores
            .transactions
            .entries_for_ledger(receivable.id())
            .unwrap();
        let revenue_entries = stores.transactions.entries_for_ledger(revenue.id()).unwrap();
        assert_eq!(receivable_entries.len() + revenue_entries.len(), 2);
    }

    #[test]
    fn get_returns_posted_transaction() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);

        let want = stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(250))
                    .entry(revenue.id(), credit(250))
                    .evidence(EntityRef::new("order", 42)),
            )
            .unwrap();

        let got = stores.transactions.get(want.id()).unwrap();

        assert_eq!(want, got, "want transaction {want:?}, got {got:?}");
    }

    #[test]
    fn get_fails_on_invalid_id() {
        let stores = get_test_stores();

        assert_eq!(stores.transactions.get(99), Err(Error::NotFound));
    }

    #[test]
    fn create_fails_when_entries_do_not_balance() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);

        let result = stores.transactions.create(
            TransactionBuilder::new(1)
                .entry(receivable.id(), debit(100))
                .entry(revenue.id(), credit(90)),
        );

        assert_eq!(result, Err(Error::UnbalancedEntries(10)));
        // Nothing may be written when validation fails.
        assert_eq!(stores.transactions.count(), Ok(0));
        assert_eq!(stores.balances.get_all(), Ok(vec![]));
    }

    #[test]
    fn create_fails_with_no_entries() {
        let mut stores = get_test_stores();

        let result = stores.transactions.create(TransactionBuilder::new(1));

        assert_eq!(result, Err(Error::NoLedgerEntries));
        assert_eq!(stores.transactions.count(), Ok(0));
    }

    #[test]
    fn create_fails_on_reused_entry() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);

        let posted = stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(100))
                    .entry(revenue.id(), credit(100)),
            )
            .unwrap();

        let reused = posted.entries()[0].clone();
        let reused_id = reused.id().unwrap();
        let result = stores.transactions.create(
            TransactionBuilder::new(1)
                .with_entry(reused)
                .entry(revenue.id(), credit(100)),
        );

        assert_eq!(result, Err(Error::ExistingLedgerEntry(reused_id)));
        assert_eq!(stores.transactions.count(), Ok(1));
    }

    #[test]
    fn create_fails_on_unknown_ledger() {
        let mut stores = get_test_stores();

        let result = stores.transactions.create(
            TransactionBuilder::new(1)
                .entry(999, debit(10))
                .entry(999, credit(10)),
        );

        assert_eq!(result, Err(Error::InvalidLedger(999)));
        assert_eq!(stores.transactions.count(), Ok(0));
    }

    #[test]
    fn default_kind_is_manual() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);

        let posted = stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(100))
                    .entry(revenue.id(), credit(100)),
            )
            .unwrap();

        let kind = stores.transactions.get_kind(posted.kind_id()).unwrap();
        assert_eq!(kind.name(), TransactionKind::MANUAL);

        // The default kind is created once and reused.
        let second = stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(50))
                    .entry(revenue.id(), credit(50)),
            )
            .unwrap();
        assert_eq!(second.kind_id(), posted.kind_id());
    }

    #[test]
    fn explicit_kind_is_created_on_first_use() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);

        let posted = stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(100))
                    .entry(revenue.id(), credit(100))
                    .kind("Reconciliation"),
            )
            .unwrap();

        let kind = stores.transactions.get_kind(posted.kind_id()).unwrap();
        assert_eq!(kind.name(), "Reconciliation");

        let same_kind = stores
            .transactions
            .get_or_create_kind("Reconciliation", "")
            .unwrap();
        assert_eq!(same_kind, kind, "want the same kind row from both calls");
    }

    #[test]
    fn backdated_posted_timestamp_is_preserved() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);
        let backdated = datetime!(2019-06-30 12:00 UTC);

        let posted = stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(100))
                    .entry(revenue.id(), credit(100))
                    .posted_at(backdated),
            )
            .unwrap();

        assert_eq!(posted.posted_at(), backdated);
        assert_eq!(
            stores.transactions.get(posted.id()).unwrap().posted_at(),
            backdated
        );
    }

    #[test]
    fn evidence_links_are_deduplicated() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);
        let order = EntityRef::new("order", 42);

        let posted = stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(100))
                    .entry(revenue.id(), credit(100))
                    .evidence(order.clone())
                    .evidence(order.clone()),
            )
            .unwrap();

        assert_eq!(posted.evidence(), &[order.clone()]);

        // The duplicate must not double the balance increment either.
        let balances = stores.balances.balances_for(&order).unwrap();
        assert_eq!(balances.balance_for(receivable.id()), 100);
        assert_eq!(balances.balance_for(revenue.id()), -100);
    }

    #[test]
    fn balance_cache_tracks_per_evidence_totals() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);
        let order_a = EntityRef::new("order", 1);
        let order_b = EntityRef::new("order", 2);

        stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(10))
                    .entry(revenue.id(), credit(10))
                    .evidence(order_a.clone()),
            )
            .unwrap();
        stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(20))
                    .entry(revenue.id(), credit(20))
                    .evidence(order_a.clone())
                    .evidence(order_b.clone()),
            )
            .unwrap();

        let balances_a = stores.balances.balances_for(&order_a).unwrap();
        assert_eq!(balances_a.balance_for(receivable.id()), 30);
        assert_eq!(balances_a.balance_for(revenue.id()), -30);

        let balances_b = stores.balances.balances_for(&order_b).unwrap();
        assert_eq!(balances_b.balance_for(receivable.id()), 20);
        assert_eq!(balances_b.balance_for(revenue.id()), -20);
    }

    /// The matching scenario from the module contract: T1 has evidence {A},
    /// T2 has {A, B}, T3 has {B}.
    fn get_matching_fixture(stores: &mut LedgerStores) -> (EntityRef, EntityRef, [DatabaseID; 3]) {
        let (receivable, revenue) = get_test_ledgers(stores);
        let a = EntityRef::new("order", 1);
        let b = EntityRef::new("order", 2);

        let evidence_sets = [vec![a.clone()], vec![a.clone(), b.clone()], vec![b.clone()]];
        let mut ids = [0; 3];

        for (i, evidence_set) in evidence_sets.into_iter().enumerate() {
            let mut builder = TransactionBuilder::new(1)
                .entry(receivable.id(), debit(100))
                .entry(revenue.id(), credit(100));

            for entity in evidence_set {
                builder = builder.evidence(entity);
            }

            ids[i] = stores.transactions.create(builder).unwrap().id();
        }

        (a, b, ids)
    }

    #[test]
    fn match_any_returns_transactions_with_any_linked_object() {
        let mut stores = get_test_stores();
        let (a, b, [t1, t2, t3]) = get_matching_fixture(&mut stores);

        let got = stores
            .transactions
            .find_by_evidence(&[a.clone()], MatchType::Any)
            .unwrap();
        assert_eq!(transaction_ids(&got), vec![t1, t2]);

        let got = stores
            .transactions
            .find_by_evidence(&[a, b], MatchType::Any)
            .unwrap();
        assert_eq!(transaction_ids(&got), vec![t1, t2, t3]);
    }

    #[test]
    fn match_all_allows_supersets() {
        let mut stores = get_test_stores();
        let (a, b, [t1, t2, _]) = get_matching_fixture(&mut stores);

        let got = stores
            .transactions
            .find_by_evidence(&[a.clone()], MatchType::All)
            .unwrap();
        assert_eq!(transaction_ids(&got), vec![t1, t2]);

        let got = stores
            .transactions
            .find_by_evidence(&[a, b], MatchType::All)
            .unwrap();
        assert_eq!(transaction_ids(&got), vec![t2]);
    }

    #[test]
    fn match_none_excludes_every_linked_object() {
        let mut stores = get_test_stores();
        let (a, b, [t1, _, t3]) = get_matching_fixture(&mut stores);

        let got = stores
            .transactions
            .find_by_evidence(&[a], MatchType::None)
            .unwrap();
        assert_eq!(transaction_ids(&got), vec![t3]);

        let got = stores
            .transactions
            .find_by_evidence(&[b], MatchType::None)
            .unwrap();
        assert_eq!(transaction_ids(&got), vec![t1]);
    }

    #[test]
    fn match_exact_requires_set_equality() {
        let mut stores = get_test_stores();
        let (a, b, [t1, t2, _]) = get_matching_fixture(&mut stores);

        let got = stores
            .transactions
            .find_by_evidence(&[a.clone()], MatchType::Exact)
            .unwrap();
        assert_eq!(transaction_ids(&got), vec![t1]);

        let got = stores
            .transactions
            .find_by_evidence(&[a, b], MatchType::Exact)
            .unwrap();
        assert_eq!(transaction_ids(&got), vec![t2]);
    }

    #[test]
    fn match_exact_with_no_evidence_returns_evidence_free_transactions() {
        let mut stores = get_test_stores();
        let (a, _, _) = get_matching_fixture(&mut stores);

        let got = stores
            .transactions
            .find_by_evidence(&[], MatchType::Exact)
            .unwrap();
        assert_eq!(got, vec![], "want no matches, got {got:?}");

        let receivable = stores.ledgers.get_by_name("Accounts Receivable").unwrap();
        let revenue = stores.ledgers.get_by_name("Revenue").unwrap();
        let bare = stores
            .transactions
            .create(
                TransactionBuilder::new(1)
                    .entry(receivable.id(), debit(5))
                    .entry(revenue.id(), credit(5)),
            )
            .unwrap();

        let got = stores
            .transactions
            .find_by_evidence(&[], MatchType::Exact)
            .unwrap();
        assert_eq!(transaction_ids(&got), vec![bare.id()]);

        // An empty set places no constraint under the other semantics.
        let got = stores
            .transactions
            .find_by_evidence(&[], MatchType::All)
            .unwrap();
        assert_eq!(got.len(), 4, "want all 4 transactions, got {}", got.len());

        // Matching is unaffected by duplicate inputs.
        let got = stores
            .transactions
            .find_by_evidence(&[a.clone(), a], MatchType::Exact)
            .unwrap();
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn get_query_with_limit_and_offset() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);

        let mut ids = Vec::new();
        for magnitude in 1..=5 {
            let posted = stores
                .transactions
                .create(
                    TransactionBuilder::new(1)
                        .entry(receivable.id(), debit(magnitude))
                        .entry(revenue.id(), credit(magnitude)),
                )
                .unwrap();
            ids.push(posted.id());
        }

        let got = stores
            .transactions
            .get_query(TransactionQuery {
                limit: Some(2),
                offset: 1,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(transaction_ids(&got), ids[1..3].to_vec());
    }

    #[test]
    fn concurrent_postings_do_not_lose_updates() {
        let mut stores = get_test_stores();
        let (receivable, revenue) = get_test_ledgers(&mut stores);
        let order = EntityRef::new("order", 42);

        let mut handles = Vec::new();
        for magnitude in [10i64, 20] {
            let mut transactions = stores.transactions.clone();
            let order = order.clone();
            let receivable_id = receivable.id();
            let revenue_id = revenue.id();

            handles.push(std::thread::spawn(move || {
                transactions
                    .create(
                        TransactionBuilder::new(1)
                            .entry(receivable_id, debit(magnitude))
                            .entry(revenue_id, credit(magnitude))
                            .evidence(order),
                    )
                    .expect("could not post transaction");
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let balances = stores.balances.balances_for(&order).unwrap();
        assert_eq!(balances.balance_for(receivable.id()), 30);
        assert_eq!(balances.balance_for(revenue.id()), -30);
        assert_eq!(stores.transactions.count(), Ok(2));
    }

    proptest! {
        /// Construction must fail unless the net sum of a random mix of
        /// debit and credit amounts is exactly zero.
        #[test]
        fn posting_fails_unless_entries_sum_to_zero(
            amounts in prop::collection::vec(-1_000_000i64..1_000_000i64, 1..8)
        ) {
            let mut stores = get_test_stores();
            let ledger = stores.ledgers.create("Revenue", 4000, true, "").unwrap();

            let mut builder = TransactionBuilder::new(1);
            for amount in &amounts {
                builder = builder.entry(ledger.id(), *amount);
            }

            let net: i128 = amounts.iter().map(|&amount| i128::from(amount)).sum();
            let result = stores.transactions.create(builder);

            if net == 0 {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result, Err(Error::UnbalancedEntries(net)));
            }
        }

        /// After any sequence of postings, recomputing balances from the raw
        /// entries must equal the cached balance rows.
        #[test]
        fn cached_balances_match_recomputed_entries(
            magnitudes in prop::collection::vec(1i64..1_000_000i64, 1..10)
        ) {
            let mut stores = get_test_stores();
            let (receivable, revenue) = get_test_ledgers(&mut stores);
            let order = EntityRef::new("order", 7);

            for magnitude in &magnitudes {
                stores
                    .transactions
                    .create(
                        TransactionBuilder::new(1)
                            .entry(receivable.id(), debit(*magnitude))
                            .entry(revenue.id(), credit(*magnitude))
                            .evidence(order.clone()),
                    )
                    .unwrap();
            }

            let total: i64 = magnitudes.iter().sum();
            let balances = stores.balances.balances_for(&order).unwrap();

            prop_assert_eq!(balances.balance_for(receivable.id()), total);
            prop_assert_eq!(balances.balance_for(revenue.id()), -total);
            // The cache agrees with the ledger of record.
            prop_assert_eq!(stores.ledgers.balance(receivable.id()).unwrap(), total);
            prop_assert_eq!(stores.ledgers.balance(revenue.id()).unwrap(), -total);
        }
    }
}
