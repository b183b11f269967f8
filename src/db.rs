use futures::future::BoxFuture;
use time::Date;
use uuid::Uuid;

use crate::booking::{
    Booking, BookingFilter, BookingStatistics, BookingStatus, NewBooking, PageRequest,
};
use crate::catalog::{CatalogItem, CatalogRef};
use crate::customer::{Customer, GuestCustomer};
use crate::errors::BookingError;

#[cfg(test)]
pub(crate) mod mock;

/// Read-only access to courses and activities.
pub trait Catalog {
    fn find_item(&self, reference: CatalogRef)
        -> BoxFuture<Result<Option<CatalogItem>, BookingError>>;
}

pub trait Customers {
    fn find_by_phone(&self, phone: &str) -> BoxFuture<Result<Option<Customer>, BookingError>>;

    /// Inserts `guest` unless a customer already has its phone number, in
    /// one atomic step. Returns `None` if the phone number was taken, and
    /// [`BookingError::EmailTaken`] if its email was.
    fn create_if_absent(
        &self,
        guest: GuestCustomer,
    ) -> BoxFuture<Result<Option<Customer>, BookingError>>;
}

pub trait Bookings {
    fn insert(&self, booking: NewBooking) -> BoxFuture<Result<Booking, BookingError>>;

    fn retrieve(&self, id: &Uuid) -> BoxFuture<Result<Option<Booking>, BookingError>>;

    /// Sets the status to `target` only if it is still `expected`. Returns
    /// `None` if no booking matched.
    fn compare_and_set_status(
        &self,
        id: &Uuid,
        expected: BookingStatus,
        target: BookingStatus,
    ) -> BoxFuture<Result<Option<Booking>, BookingError>>;

    fn update_notes(
        &self,
        id: &Uuid,
        notes: Option<String>,
    ) -> BoxFuture<Result<Option<Booking>, BookingError>>;

    /// Returns one page of matching bookings, newest first, and the number
    /// of matches overall.
    fn list(
        &self,
        filter: BookingFilter,
        page: PageRequest,
    ) -> BoxFuture<Result<(Vec<Booking>, i64), BookingError>>;

    fn delete(&self, id: &Uuid) -> BoxFuture<Result<(), BookingError>>;

    fn statistics(&self, today: Date) -> BoxFuture<Result<BookingStatistics, BookingError>>;
}

pub trait AdminTokens {
    fn create_admin_token(&self, label: Option<String>) -> BoxFuture<Result<Uuid, BookingError>>;

    fn is_admin_token(&self, token: &Uuid) -> BoxFuture<Result<bool, BookingError>>;
}

/// Everything the service needs from storage.
pub trait Db: Catalog + Customers + Bookings + AdminTokens + Send + Sync {}

impl<T: Catalog + Customers + Bookings + AdminTokens + Send + Sync> Db for T {}

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{
        self,
        postgres::{PgPool, PgRow},
    };
    use time::{Date, OffsetDateTime};
    use uuid::Uuid;

    use crate::booking::{
        Booking, BookingFilter, BookingStatistics, BookingStatus, NewBooking, PageRequest, Times,
    };
    use crate::catalog::{CatalogItem, CatalogRef, CatalogSummary, Id};
    use crate::customer::{Customer, CustomerSummary, GuestCustomer, Role};
    use crate::errors::BookingError;
    use crate::money::Money;

    const CUSTOMERS_EMAIL_CONSTRAINT: &str = "customers_email";
    const BOOKINGS_COURSE_CONSTRAINT: &str = "bookings_course";
    const BOOKINGS_ACTIVITY_CONSTRAINT: &str = "bookings_activity";

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Catalog for PgDb {
        fn find_item(
            &self,
            reference: CatalogRef,
        ) -> BoxFuture<Result<Option<CatalogItem>, BookingError>> {
            async move {
                let query = match reference {
                    CatalogRef::Course(_) => sqlx::query(include_str!("queries/find_course.sql")),
                    CatalogRef::Activity(_) => {
                        sqlx::query(include_str!("queries/find_activity.sql"))
                    }
                };

                let item: Option<CatalogItem> = query
                    .bind(reference.id())
                    .try_map(|row: PgRow| {
                        let price_cents: i64 = try_get(&row, "price_cents")?;

                        Ok(CatalogItem::new(
                            reference,
                            try_get(&row, "name")?,
                            Money::from_cents(price_cents).map_err(decode_error)?,
                            try_get(&row, "duration_hours")?,
                            try_get(&row, "max_participants")?,
                            try_get(&row, "is_active")?,
                        ))
                    })
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(item)
            }
            .boxed()
        }
    }

    impl super::Customers for PgDb {
        fn find_by_phone(&self, phone: &str) -> BoxFuture<Result<Option<Customer>, BookingError>> {
            let phone = phone.to_owned();

            async move {
                let query = sqlx::query(include_str!("queries/find_customer_by_phone.sql"));

                let customer = query
                    .bind(phone)
                    .try_map(|row: PgRow| customer_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(customer)
            }
            .boxed()
        }

        fn create_if_absent(
            &self,
            guest: GuestCustomer,
        ) -> BoxFuture<Result<Option<Customer>, BookingError>> {
            async move {
                let query = sqlx::query(include_str!("queries/create_guest.sql"));

                let email = guest.email.clone();

                let customer = query
                    .bind(guest.id)
                    .bind(guest.name)
                    .bind(guest.phone)
                    .bind(guest.email)
                    .try_map(|row: PgRow| customer_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|error| match error {
                        sqlx::Error::Database(ref e)
                            if e.constraint() == Some(CUSTOMERS_EMAIL_CONSTRAINT) =>
                        {
                            BookingError::EmailTaken(email)
                        }
                        _ => map_sqlx_error(error),
                    })?;

                Ok(customer)
            }
            .boxed()
        }
    }

    impl super::Bookings for PgDb {
        fn insert(&self, booking: NewBooking) -> BoxFuture<Result<Booking, BookingError>> {
            async move {
                let query = sqlx::query(include_str!("queries/insert_booking.sql"));

                let reference = booking.reference;

                let inserted = query
                    .bind(booking.id)
                    .bind(booking.customer_id)
                    .bind(reference.course_id())
                    .bind(reference.activity_id())
                    .bind(booking.date)
                    .bind(booking.time)
                    .bind(booking.participants)
                    .bind(booking.total_price.cents())
                    .bind(booking.status.as_str())
                    .bind(booking.notes)
                    .try_map(|row: PgRow| booking_from_row(&row))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|error| match error {
                        sqlx::Error::Database(ref e)
                            if e.constraint() == Some(BOOKINGS_COURSE_CONSTRAINT)
                                || e.constraint() == Some(BOOKINGS_ACTIVITY_CONSTRAINT) =>
                        {
                            BookingError::CatalogItemNotFound(reference)
                        }
                        _ => map_sqlx_error(error),
                    })?;

                Ok(inserted)
            }
            .boxed()
        }

        fn retrieve(&self, id: &Uuid) -> BoxFuture<Result<Option<Booking>, BookingError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_booking.sql"));

                let booking = query
                    .bind(id)
                    .try_map(|row: PgRow| booking_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(booking)
            }
            .boxed()
        }

        fn compare_and_set_status(
            &self,
            id: &Uuid,
            expected: BookingStatus,
            target: BookingStatus,
        ) -> BoxFuture<Result<Option<Booking>, BookingError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/update_status.sql"));

                let booking = query
                    .bind(id)
                    .bind(expected.as_str())
                    .bind(target.as_str())
                    .try_map(|row: PgRow| booking_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(booking)
            }
            .boxed()
        }

        fn update_notes(
            &self,
            id: &Uuid,
            notes: Option<String>,
        ) -> BoxFuture<Result<Option<Booking>, BookingError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/update_notes.sql"));

                let booking = query
                    .bind(id)
                    .bind(notes)
                    .try_map(|row: PgRow| booking_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(booking)
            }
            .boxed()
        }

        fn list(
            &self,
            filter: BookingFilter,
            page: PageRequest,
        ) -> BoxFuture<Result<(Vec<Booking>, i64), BookingError>> {
            async move {
                let status = filter.status.map(|s| s.as_str());
                let kind = filter.kind.map(|k| k.as_str());

                let bookings = sqlx::query(include_str!("queries/list_bookings.sql"))
                    .bind(status)
                    .bind(filter.from)
                    .bind(filter.to)
                    .bind(filter.customer_id)
                    .bind(kind)
                    .bind(page.limit)
                    .bind(page.offset())
                    .try_map(|row: PgRow| booking_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                let (total,): (i64,) = sqlx::query_as(include_str!("queries/count_bookings.sql"))
                    .bind(status)
                    .bind(filter.from)
                    .bind(filter.to)
                    .bind(filter.customer_id)
                    .bind(kind)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok((bookings, total))
            }
            .boxed()
        }

        fn delete(&self, id: &Uuid) -> BoxFuture<Result<(), BookingError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/delete_booking.sql"));

                let count = query
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if count == 0 {
                    Err(BookingError::BookingNotFound(id))
                } else {
                    Ok(())
                }
            }
            .boxed()
        }

        fn statistics(&self, today: Date) -> BoxFuture<Result<BookingStatistics, BookingError>> {
            async move {
                let query = sqlx::query(include_str!("queries/statistics.sql"));

                let statistics = query
                    .bind(today)
                    .try_map(|row: PgRow| {
                        let revenue_cents: i64 = try_get(&row, "revenue_cents")?;

                        Ok(BookingStatistics {
                            total: try_get(&row, "total")?,
                            pending: try_get(&row, "pending")?,
                            confirmed: try_get(&row, "confirmed")?,
                            cancelled: try_get(&row, "cancelled")?,
                            completed: try_get(&row, "completed")?,
                            today: try_get(&row, "today")?,
                            revenue: Money::from_cents(revenue_cents).map_err(decode_error)?,
                        })
                    })
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(statistics)
            }
            .boxed()
        }
    }

    impl super::AdminTokens for PgDb {
        fn create_admin_token(
            &self,
            label: Option<String>,
        ) -> BoxFuture<Result<Uuid, BookingError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/create_admin_token.sql"));

                let (token,): (Uuid,) = query
                    .bind(Uuid::new_v4())
                    .bind(label)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(token)
            }
            .boxed()
        }

        fn is_admin_token(&self, token: &Uuid) -> BoxFuture<Result<bool, BookingError>> {
            let token = *token;

            async move {
                let query = sqlx::query_as(include_str!("queries/is_admin_token.sql"));

                let (valid,): (bool,) = query
                    .bind(token)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(valid)
            }
            .boxed()
        }
    }

    fn customer_from_row(row: &PgRow) -> Result<Customer, sqlx::Error> {
        let role: String = try_get(row, "role")?;
        let role: Role = role
            .parse()
            .map_err(|role| decode_error(format!("unknown role {}", role)))?;

        Ok(Customer::new(
            try_get(row, "id")?,
            try_get(row, "name")?,
            try_get(row, "phone")?,
            try_get(row, "email")?,
            role,
            try_get(row, "created_at")?,
        ))
    }

    /// Maps a booking row joined with its customer and catalog item.
    fn booking_from_row(row: &PgRow) -> Result<Booking, sqlx::Error> {
        let course_id: Option<Id> = try_get(row, "course_id")?;
        let activity_id: Option<Id> = try_get(row, "activity_id")?;

        // the table constraint guarantees exactly one of these
        let reference = CatalogRef::from_parts(course_id, activity_id)
            .ok_or_else(|| decode_error("booking must reference exactly one catalog item"))?;

        let status: String = try_get(row, "status")?;
        let status: BookingStatus = status.parse().map_err(decode_error)?;

        let total_price_cents: i64 = try_get(row, "total_price_cents")?;

        let customer = CustomerSummary {
            id: try_get(row, "customer_id")?,
            name: try_get(row, "customer_name")?,
            email: try_get(row, "customer_email")?,
            phone: try_get(row, "customer_phone")?,
        };

        let created_at: OffsetDateTime = try_get(row, "created_at")?;
        let updated_at: OffsetDateTime = try_get(row, "updated_at")?;

        Ok(Booking {
            id: try_get(row, "id")?,
            customer,
            item: CatalogSummary::new(reference, try_get(row, "item_name")?),
            date: try_get(row, "booking_date")?,
            time: try_get(row, "booking_time")?,
            participants: try_get(row, "participants")?,
            total_price: Money::from_cents(total_price_cents).map_err(decode_error)?,
            status,
            notes: try_get(row, "notes")?,
            times: Times {
                created_at,
                updated_at,
            },
        })
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::prelude::*;

        row.try_get(column)
    }

    fn decode_error(error: impl ToString) -> sqlx::Error {
        sqlx::Error::Decode(error.to_string().into())
    }

    fn map_sqlx_error(error: sqlx::Error) -> BookingError {
        BookingError::Sqlx { source: error }
    }
}
