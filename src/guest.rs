//! Turns a phone number into a customer, creating a guest account the first
//! time a number is seen.

use log::{debug, info, o, Logger};
use uuid::Uuid;

use crate::customer::{Customer, GuestCustomer};
use crate::db::Customers;
use crate::errors::BookingError;

const GUEST_EMAIL_DOMAIN: &str = "guest.com";

#[derive(Debug)]
pub struct Resolution {
    pub customer: Customer,

    /// Whether this call created the customer.
    pub created: bool,
}

/// Derives the email of the guest account for `phone`: its digits, in a
/// fixed domain. When the plain form is already taken, the guest's own ID
/// is appended as `disambiguator`.
///
/// ```
/// use bookings::guest::guest_email;
/// use uuid::Uuid;
///
/// assert_eq!(guest_email("+33 6 12-34-56-78", None), "guest_33612345678@guest.com");
/// assert_eq!(
///     guest_email("0612345678", Some(&Uuid::nil())),
///     "guest_0612345678_00000000000000000000000000000000@guest.com"
/// );
/// ```
pub fn guest_email(phone: &str, disambiguator: Option<&Uuid>) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();

    let email = match disambiguator {
        None => format!("guest_{}@{}", digits, GUEST_EMAIL_DOMAIN),
        Some(id) => format!("guest_{}_{}@{}", digits, id.to_simple(), GUEST_EMAIL_DOMAIN),
    };

    email.to_lowercase()
}

fn new_guest(name: &str, phone: &str, disambiguate: bool) -> GuestCustomer {
    let guest = GuestCustomer::new(name.to_owned(), phone.to_owned(), guest_email(phone, None));

    if disambiguate {
        let email = guest_email(phone, Some(&guest.id));
        GuestCustomer { email, ..guest }
    } else {
        guest
    }
}

/// Returns the customer with phone number `phone`, creating a guest account
/// named `name` if there is none. An existing customer keeps their stored
/// name.
pub async fn resolve<C: Customers + ?Sized>(
    customers: &C,
    logger: &Logger,
    phone: &str,
    name: &str,
) -> Result<Resolution, BookingError> {
    let phone = phone.trim();
    let name = name.trim();

    if phone.is_empty() {
        return Err(BookingError::MissingField("phone"));
    }

    if !phone.chars().any(|c| c.is_ascii_digit()) {
        return Err(BookingError::InvalidPhone(phone.to_owned()));
    }

    if name.is_empty() {
        return Err(BookingError::MissingField("name"));
    }

    let logger = logger.new(o!("phone" => phone.to_owned()));

    if let Some(customer) = customers.find_by_phone(phone).await? {
        debug!(logger, "Found existing customer"; "customer_id" => %customer.id());
        return Ok(Resolution {
            customer,
            created: false,
        });
    }

    let mut disambiguate = false;

    loop {
        let guest = new_guest(name, phone, disambiguate);

        match customers.create_if_absent(guest).await {
            Ok(Some(customer)) => {
                info!(logger, "Created guest customer"; "customer_id" => %customer.id(), "email" => customer.email());
                return Ok(Resolution {
                    customer,
                    created: true,
                });
            }
            Ok(None) => {
                // somebody else created it between our lookup and insert
                debug!(logger, "Lost guest creation race, reading winner...");

                if let Some(customer) = customers.find_by_phone(phone).await? {
                    return Ok(Resolution {
                        customer,
                        created: false,
                    });
                }
            }
            Err(BookingError::EmailTaken(email)) => {
                info!(logger, "Guest email already taken, retrying with a unique one"; "email" => email);
                disambiguate = true;
            }
            Err(e) => return Err(e),
        }
    }
}
