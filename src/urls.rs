use url::{ParseError, Url};
use uuid::Uuid;

/// Convenience wrapper for URL generation functions.
#[derive(Clone, Debug)]
pub struct Urls {
    /// Path for all booking-related actions.
    pub(crate) bookings_path: String,

    /// Absolute URL of the booking routes, including trailing slash.
    bookings: Url,
}

impl Urls {
    /// Create a new instance. `bookings_path` should *not* include a
    /// trailing slash.
    pub fn new(base: &str, bookings_path: impl Into<String>) -> Result<Self, ParseError> {
        let bookings_path = bookings_path.into();
        let bookings = Url::parse(base)?.join(&format!("{}/", bookings_path))?;

        if bookings.cannot_be_a_base() {
            return Err(ParseError::RelativeUrlWithCannotBeABaseBase);
        }

        Ok(Urls {
            bookings_path,
            bookings,
        })
    }

    pub fn bookings(&self) -> &Url {
        &self.bookings
    }

    /// The URL a booking can be retrieved from.
    pub fn booking(&self, id: &Uuid) -> Url {
        let mut url = self.bookings.clone();

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("id").push(&id.to_string());
        }

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_urls_live_under_the_prefix() {
        let urls = Urls::new("https://example.com/api/", "bookings").unwrap();
        let id = Uuid::nil();

        assert_eq!(urls.bookings().as_str(), "https://example.com/api/bookings/");
        assert_eq!(
            urls.booking(&id).as_str(),
            "https://example.com/api/bookings/id/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn base_must_be_hierarchical() {
        assert!(Urls::new("mailto:someone@example.com", "bookings").is_err());
        assert!(Urls::new("not a url", "bookings").is_err());
    }
}
