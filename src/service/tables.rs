use tracing::info;

use super::validation::validate_positive;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{NewTable, Table};

/// Creates a table. New tables are always available.
pub fn create_table(store: &dyn Store, table: NewTable) -> Result<Table> {
    let table = NewTable {
        number: validate_positive("numero", table.number)?,
        capacity: validate_positive("capacidade", table.capacity)?,
    };

    let created = store.create_table(&table)?;
    info!(table_id = created.id, number = created.number, "table created");
    Ok(created)
}

pub fn list_tables(store: &dyn Store) -> Result<Vec<Table>> {
    store.list_tables()
}

/// Overrides the availability flag. `None` leaves the table untouched.
pub fn update_availability(store: &dyn Store, id: i64, available: Option<bool>) -> Result<Table> {
    let mut table = store
        .get_table(id)?
        .ok_or_else(|| Error::not_found("Table not found"))?;

    if let Some(available) = available {
        store.set_table_available(id, available)?;
        table.available = available;
        info!(table_id = id, available, "table availability set");
    }

    Ok(table)
}

/// Deletes a table that no reservation references, active or not.
pub fn delete_table(store: &dyn Store, id: i64) -> Result<()> {
    store
        .get_table(id)?
        .ok_or_else(|| Error::not_found("Table not found"))?;

    if store.count_table_reservations(id)? > 0 {
        return Err(Error::conflict(
            "Table has reservations and cannot be deleted",
        ));
    }

    store.delete_table(id)?;
    info!(table_id = id, "table deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::reservations::{self, ReservationRequest};
    use crate::service::testing::TestStore;
    use crate::types::NewCustomer;

    #[test]
    fn test_create_defaults_to_available() {
        let fixture = TestStore::new();
        let table = create_table(
            &fixture.store,
            NewTable {
                number: 5,
                capacity: 4,
            },
        )
        .unwrap();

        assert!(table.available);
        assert_eq!(list_tables(&fixture.store).unwrap(), vec![table]);
    }

    #[test]
    fn test_create_rejects_non_positive_values() {
        let fixture = TestStore::new();
        let result = create_table(
            &fixture.store,
            NewTable {
                number: 5,
                capacity: 0,
            },
        );
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_update_availability_is_partial() {
        let fixture = TestStore::new();
        let store = &fixture.store;
        let table = create_table(
            store,
            NewTable {
                number: 5,
                capacity: 4,
            },
        )
        .unwrap();

        let unchanged = update_availability(store, table.id, None).unwrap();
        assert!(unchanged.available);

        let blocked = update_availability(store, table.id, Some(false)).unwrap();
        assert!(!blocked.available);
        assert!(!store.get_table(table.id).unwrap().unwrap().available);

        assert!(matches!(
            update_availability(store, 99, Some(true)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_blocked_even_by_cancelled_reservation() {
        let fixture = TestStore::new();
        let store = &fixture.store;
        let customer = store
            .create_customer(&NewCustomer {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                phone: String::new(),
            })
            .unwrap();
        let table = create_table(
            store,
            NewTable {
                number: 5,
                capacity: 4,
            },
        )
        .unwrap();
        let reservation = reservations::create_reservation(
            store,
            ReservationRequest {
                customer_id: customer.id,
                table_id: table.id,
                date: "2024-06-01".to_string(),
                time: "19:00".to_string(),
                status: None,
            },
        )
        .unwrap();
        reservations::update_status(store, reservation.id, "Cancelada").unwrap();

        assert!(matches!(delete_table(store, table.id), Err(Error::Conflict(_))));

        reservations::delete_reservation(store, reservation.id).unwrap();
        delete_table(store, table.id).unwrap();
        assert!(store.get_table(table.id).unwrap().is_none());
    }
}
