use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use futures::future::{BoxFuture, FutureExt};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::booking::{
    Booking, BookingFilter, BookingStatistics, BookingStatus, NewBooking, PageRequest, Times,
};
use crate::catalog::{CatalogItem, CatalogRef, CatalogSummary, Id};
use crate::customer::{Customer, GuestCustomer, Role};
use crate::errors::BookingError;
use crate::money::Money;

#[derive(Default)]
struct State {
    catalog: HashMap<CatalogRef, CatalogItem>,
    customers: Vec<Customer>,
    bookings: Vec<(NewBooking, Times)>,
    admin_tokens: HashSet<Uuid>,
}

/// An in-memory stand-in for Postgres, with knobs for failure paths.
#[derive(Default)]
pub(crate) struct MockDb {
    state: RwLock<State>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    miss_next_phone_lookup: AtomicBool,
    status_race: Mutex<Option<BookingStatus>>,
}

impl MockDb {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_course(self, id: Id, name: &str, price_cents: i64) -> Self {
        self.with_item(CatalogRef::Course(id), name, price_cents, Some(6), true)
    }

    pub fn with_activity(self, id: Id, name: &str, price_cents: i64) -> Self {
        self.with_item(CatalogRef::Activity(id), name, price_cents, None, true)
    }

    pub fn with_item(
        self,
        reference: CatalogRef,
        name: &str,
        price_cents: i64,
        max_participants: Option<i32>,
        is_active: bool,
    ) -> Self {
        let item = CatalogItem::new(
            reference,
            name.to_owned(),
            Money::from_cents(price_cents).unwrap(),
            2,
            max_participants,
            is_active,
        );

        self.state.write().unwrap().catalog.insert(reference, item);

        self
    }

    /// Adds a registered customer and returns their ID.
    pub fn add_customer(&self, name: &str, phone: Option<&str>, email: &str) -> Uuid {
        let customer = Customer::new(
            Uuid::new_v4(),
            name.to_owned(),
            phone.map(str::to_owned),
            email.to_owned(),
            Role::Customer,
            OffsetDateTime::now_utc(),
        );
        let id = customer.id();

        self.state.write().unwrap().customers.push(customer);

        id
    }

    pub fn add_admin_token(&self) -> Uuid {
        let token = Uuid::new_v4();
        self.state.write().unwrap().admin_tokens.insert(token);

        token
    }

    pub fn customer(&self, id: Uuid) -> Option<Customer> {
        let state = self.state.read().unwrap();

        state.customers.iter().find(|c| c.id == id).cloned()
    }

    pub fn customer_count(&self) -> usize {
        self.state.read().unwrap().customers.len()
    }

    pub fn booking_count(&self) -> usize {
        self.state.read().unwrap().bookings.len()
    }

    pub fn stored_status(&self, id: Uuid) -> Option<BookingStatus> {
        let state = self.state.read().unwrap();

        state
            .bookings
            .iter()
            .find(|(b, _)| b.id == id)
            .map(|(b, _)| b.status)
    }

    /// Makes every write fail as if the database were unreachable.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Makes booking reads fail as if the database were unreachable.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Makes the next phone lookup miss, as if another request created the
    /// customer just after we looked.
    pub fn miss_next_phone_lookup(&self) {
        self.miss_next_phone_lookup.store(true, Ordering::SeqCst);
    }

    /// Makes the next compare-and-set see `status`, as if another request
    /// changed it first.
    pub fn race_next_status_change(&self, status: BookingStatus) {
        *self.status_race.lock().unwrap() = Some(status);
    }

    fn check_writable(&self) -> Result<(), BookingError> {
        check(&self.fail_writes)
    }

    fn check_readable(&self) -> Result<(), BookingError> {
        check(&self.fail_reads)
    }
}

fn check(failing: &AtomicBool) -> Result<(), BookingError> {
    if failing.load(Ordering::SeqCst) {
        Err(BookingError::Sqlx {
            source: sqlx::Error::PoolTimedOut,
        })
    } else {
        Ok(())
    }
}

fn join(state: &State, booking: &NewBooking, times: &Times) -> Option<Booking> {
    let customer = state.customers.iter().find(|c| c.id == booking.customer_id)?;
    let item = state.catalog.get(&booking.reference)?;

    Some(Booking {
        id: booking.id,
        customer: customer.summary(),
        item: CatalogSummary::new(booking.reference, item.name.clone()),
        date: booking.date,
        time: booking.time.clone(),
        participants: booking.participants,
        total_price: booking.total_price,
        status: booking.status,
        notes: booking.notes.clone(),
        times: times.clone(),
    })
}

fn find_joined(state: &State, id: Uuid) -> Option<Booking> {
    state
        .bookings
        .iter()
        .find(|(b, _)| b.id == id)
        .and_then(|(b, t)| join(state, b, t))
}

impl super::Catalog for MockDb {
    fn find_item(
        &self,
        reference: CatalogRef,
    ) -> BoxFuture<Result<Option<CatalogItem>, BookingError>> {
        async move { Ok(self.state.read().unwrap().catalog.get(&reference).cloned()) }.boxed()
    }
}

impl super::Customers for MockDb {
    fn find_by_phone(&self, phone: &str) -> BoxFuture<Result<Option<Customer>, BookingError>> {
        let phone = phone.to_owned();

        async move {
            if self.miss_next_phone_lookup.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }

            let state = self.state.read().unwrap();

            Ok(state
                .customers
                .iter()
                .find(|c| c.phone.as_deref() == Some(phone.as_str()))
                .cloned())
        }
        .boxed()
    }

    fn create_if_absent(
        &self,
        guest: GuestCustomer,
    ) -> BoxFuture<Result<Option<Customer>, BookingError>> {
        async move {
            self.check_writable()?;

            let mut state = self.state.write().unwrap();

            if state
                .customers
                .iter()
                .any(|c| c.phone.as_deref() == Some(guest.phone.as_str()))
            {
                return Ok(None);
            }

            if state.customers.iter().any(|c| c.email == guest.email) {
                return Err(BookingError::EmailTaken(guest.email));
            }

            let customer = Customer::new(
                guest.id,
                guest.name,
                Some(guest.phone),
                guest.email,
                Role::Customer,
                OffsetDateTime::now_utc(),
            );
            state.customers.push(customer.clone());

            Ok(Some(customer))
        }
        .boxed()
    }
}

impl super::Bookings for MockDb {
    fn insert(&self, booking: NewBooking) -> BoxFuture<Result<Booking, BookingError>> {
        async move {
            self.check_writable()?;

            let mut state = self.state.write().unwrap();

            let now = OffsetDateTime::now_utc();
            let times = Times {
                created_at: now,
                updated_at: now,
            };

            let joined = join(&state, &booking, &times)
                .ok_or(BookingError::CatalogItemNotFound(booking.reference))?;
            state.bookings.push((booking, times));

            Ok(joined)
        }
        .boxed()
    }

    fn retrieve(&self, id: &Uuid) -> BoxFuture<Result<Option<Booking>, BookingError>> {
        let id = *id;

        async move {
            self.check_readable()?;

            Ok(find_joined(&self.state.read().unwrap(), id))
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
            self.check_writable()?;

            let race = self.status_race.lock().unwrap().take();
            let mut state = self.state.write().unwrap();

            let updated = match state.bookings.iter_mut().find(|(b, _)| b.id == id) {
                Some((booking, times)) => {
                    if let Some(status) = race {
                        booking.status = status;
                    }

                    if booking.status == expected {
                        booking.status = target;
                        times.updated_at = OffsetDateTime::now_utc();
                        true
                    } else {
                        false
                    }
                }
                None => false,
            };

            Ok(if updated {
                find_joined(&state, id)
            } else {
                None
            })
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
            self.check_writable()?;

            let mut state = self.state.write().unwrap();

            match state.bookings.iter_mut().find(|(b, _)| b.id == id) {
                Some((booking, times)) => {
                    booking.notes = notes;
                    times.updated_at = OffsetDateTime::now_utc();
                }
                None => return Ok(None),
            }

            Ok(find_joined(&state, id))
        }
        .boxed()
    }

    fn list(
        &self,
        filter: BookingFilter,
        page: PageRequest,
    ) -> BoxFuture<Result<(Vec<Booking>, i64), BookingError>> {
        async move {
            let state = self.state.read().unwrap();

            // newest first
            let matching: Vec<Booking> = state
                .bookings
                .iter()
                .rev()
                .filter_map(|(b, t)| join(&state, b, t))
                .filter(|b| filter.matches(b))
                .collect();

            let total = matching.len() as i64;
            let bookings = matching
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .collect();

            Ok((bookings, total))
        }
        .boxed()
    }

    fn delete(&self, id: &Uuid) -> BoxFuture<Result<(), BookingError>> {
        let id = *id;

        async move {
            self.check_writable()?;

            let mut state = self.state.write().unwrap();
            let before = state.bookings.len();
            state.bookings.retain(|(b, _)| b.id != id);

            if state.bookings.len() == before {
                Err(BookingError::BookingNotFound(id))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn statistics(&self, today: Date) -> BoxFuture<Result<BookingStatistics, BookingError>> {
        async move {
            let state = self.state.read().unwrap();
            let mut statistics = BookingStatistics::default();

            for (booking, _) in &state.bookings {
                statistics.total += 1;

                match booking.status {
                    BookingStatus::Pending => statistics.pending += 1,
                    BookingStatus::Confirmed => statistics.confirmed += 1,
                    BookingStatus::Cancelled => statistics.cancelled += 1,
                    BookingStatus::Completed => statistics.completed += 1,
                }

                if booking.date == today {
                    statistics.today += 1;
                }

                if matches!(
                    booking.status,
                    BookingStatus::Confirmed | BookingStatus::Completed
                ) {
                    statistics.revenue = statistics
                        .revenue
                        .checked_add(booking.total_price)
                        .unwrap_or(statistics.revenue);
                }
            }

            Ok(statistics)
        }
        .boxed()
    }
}

impl super::AdminTokens for MockDb {
    fn create_admin_token(&self, _label: Option<String>) -> BoxFuture<Result<Uuid, BookingError>> {
        async move { Ok(self.add_admin_token()) }.boxed()
    }

    fn is_admin_token(&self, token: &Uuid) -> BoxFuture<Result<bool, BookingError>> {
        let token = *token;

        async move { Ok(self.state.read().unwrap().admin_tokens.contains(&token)) }.boxed()
    }
}
