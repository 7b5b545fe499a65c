use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Params, Row, Transaction, params};

use super::schema::SCHEMA;
use super::{Store, TableEffect};
use crate::error::{Error, Result};
use crate::types::*;

const CUSTOMER_COLUMNS: &str = "id, name, email, phone";
const STAFF_COLUMNS: &str = "id, name, email, role, password_hash";
const TABLE_COLUMNS: &str = "id, number, capacity, available";
const RESERVATION_COLUMNS: &str =
    "id, customer_id, table_id, reservation_date, reservation_time, status, created_at";
const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, staff_id, created_at, expires_at, last_used_at";

const RESERVATION_VIEW_QUERY: &str = "
    SELECT r.id, r.customer_id, r.table_id, r.reservation_date, r.reservation_time,
           r.status, r.created_at,
           c.name, c.email, c.phone,
           t.number, t.capacity, t.available
    FROM reservations r
    JOIN customers c ON c.id = r.customer_id
    JOIN dining_tables t ON t.id = r.table_id";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }

    fn count<P: Params>(&self, sql: &str, params: P) -> Result<i64> {
        let count: i64 = self.conn().query_row(sql, params, |row| row.get(0))?;
        Ok(count)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

// Fixed width so that stored timestamps compare correctly as text.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn status_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<ReservationStatus> {
    let raw: String = row.get(idx)?;
    ReservationStatus::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown reservation status '{raw}'").into(),
        )
    })
}

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
    })
}

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        password_hash: row.get(4)?,
    })
}

fn table_from_row(row: &Row<'_>) -> rusqlite::Result<Table> {
    Ok(Table {
        id: row.get(0)?,
        number: row.get(1)?,
        capacity: row.get(2)?,
        available: row.get(3)?,
    })
}

fn reservation_from_row(row: &Row<'_>) -> rusqlite::Result<Reservation> {
    Ok(Reservation {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        table_id: row.get(2)?,
        date: date_column(row, 3)?,
        time: row.get(4)?,
        status: status_column(row, 5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn reservation_view_from_row(row: &Row<'_>) -> rusqlite::Result<ReservationView> {
    let reservation = reservation_from_row(row)?;
    let customer = Customer {
        id: reservation.customer_id,
        name: row.get(7)?,
        email: row.get(8)?,
        phone: row.get(9)?,
    };
    let table = Table {
        id: reservation.table_id,
        number: row.get(10)?,
        capacity: row.get(11)?,
        available: row.get(12)?,
    };
    Ok(ReservationView::join(reservation, customer, table))
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        staff_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        expires_at: parse_datetime(&row.get::<_, String>(5)?),
        last_used_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
    })
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Maps UNIQUE / FOREIGN KEY failures to a domain error, everything else to `Database`.
fn on_constraint(e: rusqlite::Error, domain: impl FnOnce() -> Error) -> Error {
    if is_constraint_violation(&e) {
        domain()
    } else {
        Error::from(e)
    }
}

fn reservation_table_id(tx: &Transaction<'_>, id: i64) -> Result<Option<i64>> {
    tx.query_row(
        "SELECT table_id FROM reservations WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
    .map_err(Error::from)
}

fn claim_table(tx: &Transaction<'_>, table_id: i64) -> Result<()> {
    let claimed = tx.execute(
        "UPDATE dining_tables SET available = 0 WHERE id = ?1 AND available = 1",
        params![table_id],
    )?;
    if claimed > 0 {
        return Ok(());
    }

    let exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM dining_tables WHERE id = ?1)",
        params![table_id],
        |row| row.get(0),
    )?;
    if exists {
        Err(Error::conflict("Table is not available"))
    } else {
        Err(Error::not_found("Table not found"))
    }
}

/// Frees a table unless some other active reservation still holds it.
fn release_table(tx: &Transaction<'_>, table_id: i64, reservation_id: i64) -> Result<()> {
    tx.execute(
        "UPDATE dining_tables SET available = 1
         WHERE id = ?1
           AND NOT EXISTS (
               SELECT 1 FROM reservations
               WHERE table_id = ?1 AND id != ?2 AND status != ?3
           )",
        params![table_id, reservation_id, ReservationStatus::Cancelled.as_str()],
    )?;
    Ok(())
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Customer operations

    fn create_customer(&self, customer: &NewCustomer) -> Result<Customer> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO customers (name, email, phone) VALUES (?1, ?2, ?3)",
            params![customer.name, customer.email, customer.phone],
        )?;

        Ok(Customer {
            id: conn.last_insert_rowid(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
        })
    }

    fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"),
            params![id],
            customer_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_customers(&self) -> Result<Vec<Customer>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id"
        ))?;

        let rows = stmt.query_map([], customer_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_customer(&self, customer: &Customer) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE customers SET name = ?1, email = ?2, phone = ?3 WHERE id = ?4",
            params![customer.name, customer.email, customer.phone, customer.id],
        )?;

        if rows == 0 {
            return Err(Error::not_found("Customer not found"));
        }
        Ok(())
    }

    fn delete_customer(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM customers WHERE id = ?1", params![id])
            .map_err(|e| {
                on_constraint(e, || {
                    Error::conflict("Customer has reservations and cannot be deleted")
                })
            })?;
        Ok(rows > 0)
    }

    fn count_customer_reservations(&self, id: i64) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) FROM reservations WHERE customer_id = ?1",
            params![id],
        )
    }

    // Staff operations

    fn create_staff(&self, staff: &NewStaff) -> Result<Staff> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO staff (name, email, role, password_hash) VALUES (?1, ?2, ?3, ?4)",
            params![staff.name, staff.email, staff.role, staff.password_hash],
        )
        .map_err(|e| on_constraint(e, || Error::conflict("Email is already in use")))?;

        Ok(Staff {
            id: conn.last_insert_rowid(),
            name: staff.name.clone(),
            email: staff.email.clone(),
            role: staff.role.clone(),
            password_hash: staff.password_hash.clone(),
        })
    }

    fn get_staff(&self, id: i64) -> Result<Option<Staff>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1"),
            params![id],
            staff_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_staff_by_email(&self, email: &str) -> Result<Option<Staff>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE email = ?1"),
            params![email],
            staff_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_staff(&self) -> Result<Vec<Staff>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {STAFF_COLUMNS} FROM staff ORDER BY id"))?;

        let rows = stmt.query_map([], staff_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_staff(&self, staff: &Staff) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE staff SET name = ?1, email = ?2, role = ?3, password_hash = ?4
                 WHERE id = ?5",
                params![
                    staff.name,
                    staff.email,
                    staff.role,
                    staff.password_hash,
                    staff.id
                ],
            )
            .map_err(|e| on_constraint(e, || Error::conflict("Email is already in use")))?;

        if rows == 0 {
            return Err(Error::not_found("Staff member not found"));
        }
        Ok(())
    }

    fn delete_staff(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM staff WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn count_staff(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM staff", [])
    }

    // Table operations

    fn create_table(&self, table: &NewTable) -> Result<Table> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO dining_tables (number, capacity, available) VALUES (?1, ?2, 1)",
            params![table.number, table.capacity],
        )
        .map_err(|e| {
            on_constraint(e, || {
                Error::conflict(format!("Table number {} already exists", table.number))
            })
        })?;

        Ok(Table {
            id: conn.last_insert_rowid(),
            number: table.number,
            capacity: table.capacity,
            available: true,
        })
    }

    fn get_table(&self, id: i64) -> Result<Option<Table>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TABLE_COLUMNS} FROM dining_tables WHERE id = ?1"),
            params![id],
            table_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tables(&self) -> Result<Vec<Table>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TABLE_COLUMNS} FROM dining_tables ORDER BY number"
        ))?;

        let rows = stmt.query_map([], table_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn set_table_available(&self, id: i64, available: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE dining_tables SET available = ?1 WHERE id = ?2",
            params![available, id],
        )?;

        if rows == 0 {
            return Err(Error::not_found("Table not found"));
        }
        Ok(())
    }

    fn delete_table(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM dining_tables WHERE id = ?1", params![id])
            .map_err(|e| {
                on_constraint(e, || {
                    Error::conflict("Table has reservations and cannot be deleted")
                })
            })?;
        Ok(rows > 0)
    }

    fn count_table_reservations(&self, id: i64) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) FROM reservations WHERE table_id = ?1",
            params![id],
        )
    }

    fn count_tables(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM dining_tables", [])
    }

    fn count_occupied_tables(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM dining_tables WHERE available = 0", [])
    }

    // Reservation operations

    fn create_reservation_claiming_table(
        &self,
        reservation: &NewReservation,
    ) -> Result<Reservation> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        claim_table(&tx, reservation.table_id)?;

        let created_at = Utc::now();
        tx.execute(
            "INSERT INTO reservations
                 (customer_id, table_id, reservation_date, reservation_time, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                reservation.customer_id,
                reservation.table_id,
                format_date(reservation.date),
                reservation.time,
                reservation.status.as_str(),
                format_datetime(&created_at),
            ],
        )
        .map_err(|e| on_constraint(e, || Error::not_found("Customer not found")))?;
        let id = tx.last_insert_rowid();

        tx.commit()?;

        Ok(Reservation {
            id,
            customer_id: reservation.customer_id,
            table_id: reservation.table_id,
            date: reservation.date,
            time: reservation.time.clone(),
            status: reservation.status,
            created_at,
        })
    }

    fn get_reservation(&self, id: i64) -> Result<Option<Reservation>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1"),
            params![id],
            reservation_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_reservation_view(&self, id: i64) -> Result<Option<ReservationView>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{RESERVATION_VIEW_QUERY} WHERE r.id = ?1"),
            params![id],
            reservation_view_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_reservation_views(&self) -> Result<Vec<ReservationView>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{RESERVATION_VIEW_QUERY} ORDER BY r.id"))?;

        let rows = stmt.query_map([], reservation_view_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_reservation_status(
        &self,
        id: i64,
        status: ReservationStatus,
    ) -> Result<(TableEffect, i64)> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let (current, table_id) = tx
            .query_row(
                "SELECT status, table_id FROM reservations WHERE id = ?1",
                params![id],
                |row| Ok((status_column(row, 0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?
            .ok_or_else(|| Error::not_found("Reservation not found"))?;

        let effect = TableEffect::between(current, status);
        match effect {
            TableEffect::Keep => {}
            TableEffect::Release => release_table(&tx, table_id, id)?,
            TableEffect::Claim => claim_table(&tx, table_id)?,
        }

        tx.execute(
            "UPDATE reservations SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;

        tx.commit()?;
        Ok((effect, table_id))
    }

    fn delete_reservation_releasing_table(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let Some(table_id) = reservation_table_id(&tx, id)? else {
            return Ok(false);
        };

        release_table(&tx, table_id, id)?;
        let rows = tx.execute("DELETE FROM reservations WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Reservation aggregates

    fn count_reservations(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM reservations", [])
    }

    fn count_reservations_by_status(&self, status: ReservationStatus) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) FROM reservations WHERE status = ?1",
            params![status.as_str()],
        )
    }

    fn count_reservations_on(&self, date: NaiveDate) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) FROM reservations WHERE reservation_date = ?1",
            params![format_date(date)],
        )
    }

    fn count_reservations_by_date(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, i64)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT reservation_date, COUNT(*) FROM reservations
             WHERE reservation_date BETWEEN ?1 AND ?2
             GROUP BY reservation_date
             ORDER BY reservation_date",
        )?;

        let rows = stmt.query_map(params![format_date(from), format_date(to)], |row| {
            Ok((date_column(row, 0)?, row.get::<_, i64>(1)?))
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, staff_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.staff_id,
                format_datetime(&token.created_at),
                format_datetime(&token.expires_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(on_constraint(e, || Error::TokenLookupCollision)),
        }
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM tokens WHERE expires_at < ?1",
            params![format_datetime(&now)],
        )?;
        Ok(rows)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.conn()
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn seed_customer(store: &SqliteStore) -> Customer {
        store
            .create_customer(&NewCustomer {
                name: "Ana Souza".to_string(),
                email: "ana@example.com".to_string(),
                phone: "11 5555-0000".to_string(),
            })
            .unwrap()
    }

    fn seed_table(store: &SqliteStore, number: i32) -> Table {
        store
            .create_table(&NewTable {
                number,
                capacity: 4,
            })
            .unwrap()
    }

    fn new_reservation(customer_id: i64, table_id: i64) -> NewReservation {
        NewReservation {
            customer_id,
            table_id,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            time: "19:00".to_string(),
            status: ReservationStatus::Pending,
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"customers".to_string()));
        assert!(tables.contains(&"staff".to_string()));
        assert!(tables.contains(&"dining_tables".to_string()));
        assert!(tables.contains(&"reservations".to_string()));
        assert!(tables.contains(&"tokens".to_string()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_customer(&store);

        store.initialize().unwrap();
        assert_eq!(store.list_customers().unwrap().len(), 1);
    }

    #[test]
    fn test_customer_crud() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let mut customer = seed_customer(&store);
        assert!(customer.id > 0);

        customer.phone = "11 5555-1111".to_string();
        store.update_customer(&customer).unwrap();

        let fetched = store.get_customer(customer.id).unwrap().unwrap();
        assert_eq!(fetched.phone, "11 5555-1111");

        assert!(store.delete_customer(customer.id).unwrap());
        assert!(store.get_customer(customer.id).unwrap().is_none());
        assert!(!store.delete_customer(customer.id).unwrap());
    }

    #[test]
    fn test_update_missing_customer_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let ghost = Customer {
            id: 99,
            name: "Ghost".to_string(),
            email: "ghost@example.com".to_string(),
            phone: String::new(),
        };
        assert!(matches!(
            store.update_customer(&ghost),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_table_number_conflicts() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let table = seed_table(&store, 5);
        assert!(table.available);

        let result = store.create_table(&NewTable {
            number: 5,
            capacity: 2,
        });
        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(store.count_tables().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_staff_email_conflicts() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let staff = NewStaff {
            name: "Carla".to_string(),
            email: "carla@example.com".to_string(),
            role: "garcom".to_string(),
            password_hash: "hash".to_string(),
        };
        let first = store.create_staff(&staff).unwrap();
        assert!(matches!(store.create_staff(&staff), Err(Error::Conflict(_))));
        assert!(matches!(
            store.create_staff(&NewStaff {
                email: "Carla@Example.COM".to_string(),
                ..staff.clone()
            }),
            Err(Error::Conflict(_))
        ));

        let other = store
            .create_staff(&NewStaff {
                email: "other@example.com".to_string(),
                ..staff
            })
            .unwrap();

        let mut renamed = other.clone();
        renamed.email = first.email.clone();
        assert!(matches!(store.update_staff(&renamed), Err(Error::Conflict(_))));

        let by_email = store.get_staff_by_email("carla@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, first.id);
        let by_upper = store.get_staff_by_email("CARLA@EXAMPLE.COM").unwrap().unwrap();
        assert_eq!(by_upper.id, first.id);
        assert_eq!(store.count_staff().unwrap(), 2);
    }

    #[test]
    fn test_create_reservation_claims_table() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);
        let table = seed_table(&store, 5);

        let reservation = store
            .create_reservation_claiming_table(&new_reservation(customer.id, table.id))
            .unwrap();
        assert_eq!(reservation.status, ReservationStatus::Pending);

        assert!(!store.get_table(table.id).unwrap().unwrap().available);
        assert_eq!(store.count_occupied_tables().unwrap(), 1);

        let stored = store.get_reservation(reservation.id).unwrap().unwrap();
        assert_eq!(stored, reservation);
    }

    #[test]
    fn test_create_reservation_on_taken_table_leaves_store_unchanged() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);
        let table = seed_table(&store, 5);

        store
            .create_reservation_claiming_table(&new_reservation(customer.id, table.id))
            .unwrap();

        let result = store.create_reservation_claiming_table(&new_reservation(customer.id, table.id));
        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(store.count_reservations().unwrap(), 1);
    }

    #[test]
    fn test_create_reservation_with_unknown_customer_rolls_back_claim() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let table = seed_table(&store, 5);

        let result = store.create_reservation_claiming_table(&new_reservation(404, table.id));
        assert!(matches!(result, Err(Error::NotFound(_))));

        assert!(store.get_table(table.id).unwrap().unwrap().available);
        assert_eq!(store.count_reservations().unwrap(), 0);
    }

    #[test]
    fn test_create_reservation_with_unknown_table_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);

        let result = store.create_reservation_claiming_table(&new_reservation(customer.id, 404));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_update_status_effects() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);
        let table = seed_table(&store, 5);
        let reservation = store
            .create_reservation_claiming_table(&new_reservation(customer.id, table.id))
            .unwrap();

        let applied = store
            .update_reservation_status(reservation.id, ReservationStatus::Confirmed)
            .unwrap();
        assert_eq!(applied, (TableEffect::Keep, table.id));

        let applied = store
            .update_reservation_status(reservation.id, ReservationStatus::Cancelled)
            .unwrap();
        assert_eq!(applied, (TableEffect::Release, table.id));
        assert!(store.get_table(table.id).unwrap().unwrap().available);

        let applied = store
            .update_reservation_status(reservation.id, ReservationStatus::Confirmed)
            .unwrap();
        assert_eq!(applied, (TableEffect::Claim, table.id));
        assert!(!store.get_table(table.id).unwrap().unwrap().available);
        assert_eq!(
            store.get_reservation(reservation.id).unwrap().unwrap().status,
            ReservationStatus::Confirmed
        );
    }

    #[test]
    fn test_status_update_uses_committed_status_not_caller_snapshot() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);
        let table = seed_table(&store, 5);
        let reservation = store
            .create_reservation_claiming_table(&new_reservation(customer.id, table.id))
            .unwrap();

        // A caller read the reservation as Pending, then a cancel committed.
        let snapshot = store.get_reservation(reservation.id).unwrap().unwrap();
        assert_eq!(snapshot.status, ReservationStatus::Pending);
        store
            .update_reservation_status(reservation.id, ReservationStatus::Cancelled)
            .unwrap();
        assert!(store.get_table(table.id).unwrap().unwrap().available);

        let (effect, _) = store
            .update_reservation_status(reservation.id, ReservationStatus::Confirmed)
            .unwrap();

        assert_ne!(effect, TableEffect::between(snapshot.status, ReservationStatus::Confirmed));
        assert_eq!(effect, TableEffect::Claim);
        assert!(!store.get_table(table.id).unwrap().unwrap().available);
    }

    #[test]
    fn test_failed_claim_keeps_previous_status() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);
        let table = seed_table(&store, 5);
        let first = store
            .create_reservation_claiming_table(&new_reservation(customer.id, table.id))
            .unwrap();
        store
            .update_reservation_status(first.id, ReservationStatus::Cancelled)
            .unwrap();
        store
            .create_reservation_claiming_table(&new_reservation(customer.id, table.id))
            .unwrap();

        let result = store.update_reservation_status(first.id, ReservationStatus::Pending);
        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(
            store.get_reservation(first.id).unwrap().unwrap().status,
            ReservationStatus::Cancelled
        );
    }

    #[test]
    fn test_update_status_of_missing_reservation() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let result = store.update_reservation_status(1, ReservationStatus::Confirmed);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete_reservation_releases_table() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);
        let table = seed_table(&store, 5);
        let reservation = store
            .create_reservation_claiming_table(&new_reservation(customer.id, table.id))
            .unwrap();

        assert!(store.delete_reservation_releasing_table(reservation.id).unwrap());
        assert!(store.get_table(table.id).unwrap().unwrap().available);
        assert!(store.get_reservation(reservation.id).unwrap().is_none());
        assert!(!store.delete_reservation_releasing_table(reservation.id).unwrap());
    }

    #[test]
    fn test_stale_reservation_does_not_free_reclaimed_table() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);
        let table = seed_table(&store, 5);
        let stale = store
            .create_reservation_claiming_table(&new_reservation(customer.id, table.id))
            .unwrap();
        store
            .update_reservation_status(stale.id, ReservationStatus::Cancelled)
            .unwrap();
        store
            .create_reservation_claiming_table(&new_reservation(customer.id, table.id))
            .unwrap();

        store
            .update_reservation_status(stale.id, ReservationStatus::Cancelled)
            .unwrap();
        assert!(!store.get_table(table.id).unwrap().unwrap().available);

        assert!(store.delete_reservation_releasing_table(stale.id).unwrap());
        assert!(!store.get_table(table.id).unwrap().unwrap().available);
    }

    #[test]
    fn test_referenced_rows_cannot_be_deleted() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);
        let table = seed_table(&store, 5);
        store
            .create_reservation_claiming_table(&new_reservation(customer.id, table.id))
            .unwrap();

        assert_eq!(store.count_customer_reservations(customer.id).unwrap(), 1);
        assert_eq!(store.count_table_reservations(table.id).unwrap(), 1);
        assert!(matches!(
            store.delete_customer(customer.id),
            Err(Error::Conflict(_))
        ));
        assert!(matches!(store.delete_table(table.id), Err(Error::Conflict(_))));
    }

    #[test]
    fn test_reservation_views_embed_relations() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);
        let first = seed_table(&store, 1);
        let second = seed_table(&store, 2);
        store
            .create_reservation_claiming_table(&new_reservation(customer.id, first.id))
            .unwrap();
        let last = store
            .create_reservation_claiming_table(&new_reservation(customer.id, second.id))
            .unwrap();

        let views = store.list_reservation_views().unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].customer, customer);
        assert_eq!(views[1].table.number, 2);
        assert!(!views[1].table.available);

        let view = store.get_reservation_view(last.id).unwrap().unwrap();
        assert_eq!(view.time, "19:00");
    }

    #[test]
    fn test_reservation_counts_by_date() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let customer = seed_customer(&store);
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();

        for (number, date) in [(1, day(1)), (2, day(1)), (3, day(3)), (4, day(9))] {
            let table = seed_table(&store, number);
            store
                .create_reservation_claiming_table(&NewReservation {
                    date,
                    ..new_reservation(customer.id, table.id)
                })
                .unwrap();
        }

        assert_eq!(store.count_reservations_on(day(1)).unwrap(), 2);
        assert_eq!(
            store.count_reservations_by_date(day(1), day(7)).unwrap(),
            vec![(day(1), 2), (day(3), 1)]
        );
        assert_eq!(
            store
                .count_reservations_by_status(ReservationStatus::Pending)
                .unwrap(),
            4
        );
    }

    #[test]
    fn test_token_lookup_collision_and_expiry() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let staff = store
            .create_staff(&NewStaff {
                name: "Davi".to_string(),
                email: "davi@example.com".to_string(),
                role: "gerente".to_string(),
                password_hash: "hash".to_string(),
            })
            .unwrap();

        let now = Utc::now();
        let token = Token {
            id: "token-1".to_string(),
            token_hash: "hash1".to_string(),
            token_lookup: "lookup12".to_string(),
            staff_id: staff.id,
            created_at: now,
            expires_at: now - Duration::hours(1),
            last_used_at: None,
        };
        store.create_token(&token).unwrap();

        let duplicate = Token {
            id: "token-2".to_string(),
            ..token.clone()
        };
        assert!(matches!(
            store.create_token(&duplicate),
            Err(Error::TokenLookupCollision)
        ));

        assert_eq!(store.delete_expired_tokens(now).unwrap(), 1);
        assert!(store.get_token_by_lookup("lookup12").unwrap().is_none());
    }

    #[test]
    fn test_deleting_staff_cascades_to_tokens() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let staff = store
            .create_staff(&NewStaff {
                name: "Eva".to_string(),
                email: "eva@example.com".to_string(),
                role: "garcom".to_string(),
                password_hash: "hash".to_string(),
            })
            .unwrap();
        let now = Utc::now();
        store
            .create_token(&Token {
                id: "token-1".to_string(),
                token_hash: "hash".to_string(),
                token_lookup: "abcdefgh".to_string(),
                staff_id: staff.id,
                created_at: now,
                expires_at: now + Duration::hours(1),
                last_used_at: None,
            })
            .unwrap();

        assert!(store.delete_staff(staff.id).unwrap());
        assert!(store.get_token_by_lookup("abcdefgh").unwrap().is_none());
    }
}
