use tracing::info;

use super::validation::{validate_email, validate_name};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Customer, NewCustomer};

/// Fields to change on an existing customer. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub fn create_customer(store: &dyn Store, customer: NewCustomer) -> Result<Customer> {
    let customer = NewCustomer {
        name: validate_name("nome", &customer.name)?,
        email: validate_email(&customer.email)?,
        phone: customer.phone.trim().to_string(),
    };

    let created = store.create_customer(&customer)?;
    info!(customer_id = created.id, "customer created");
    Ok(created)
}

pub fn list_customers(store: &dyn Store) -> Result<Vec<Customer>> {
    store.list_customers()
}

pub fn update_customer(store: &dyn Store, id: i64, changes: CustomerChanges) -> Result<Customer> {
    let mut customer = store
        .get_customer(id)?
        .ok_or_else(|| Error::not_found("Customer not found"))?;

    if let Some(name) = changes.name {
        customer.name = validate_name("nome", &name)?;
    }
    if let Some(email) = changes.email {
        customer.email = validate_email(&email)?;
    }
    if let Some(phone) = changes.phone {
        customer.phone = phone.trim().to_string();
    }

    store.update_customer(&customer)?;
    Ok(customer)
}

/// Deletes a customer that no reservation references.
pub fn delete_customer(store: &dyn Store, id: i64) -> Result<()> {
    store
        .get_customer(id)?
        .ok_or_else(|| Error::not_found("Customer not found"))?;

    if store.count_customer_reservations(id)? > 0 {
        return Err(Error::conflict(
            "Customer has reservations and cannot be deleted",
        ));
    }

    store.delete_customer(id)?;
    info!(customer_id = id, "customer deleted");
    Ok(())
}
