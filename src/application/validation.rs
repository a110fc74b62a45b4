//! Request validation performed before anything is sent.
//!
//! Failures use the same `ApiError::Validation` shape the backend returns for
//! a 422, so callers render local and remote field errors the same way.

use motorhub_api_types::{
    EditListing, EditVehicleData, LoginData, NewCommentData, NewEventData, NewListing, NewPostData,
    NewVehicleData, RegisterData, SellData,
};

use super::error::{ApiError, FieldErrors};
use crate::domain::calendar::parse_event_date;

const MAX_TEXT: usize = 255;
const MAX_LOCATION: usize = 100;

pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// Accumulates field messages; the first one also becomes the summary.
#[derive(Debug, Default)]
struct Checks {
    errors: FieldErrors,
    first: Option<String>,
}

impl Checks {
    fn fail(&mut self, field: &str, message: String) {
        self.first.get_or_insert_with(|| message.clone());
        self.errors.entry(field.to_string()).or_default().push(message);
    }

    fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, format!("The {} field is required.", label(field)));
        }
        self
    }

    fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.fail(
                field,
                format!("The {} field must not be greater than {max} characters.", label(field)),
            );
        }
        self
    }

    fn positive(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() || value <= 0.0 {
            self.fail(field, format!("The {} field must be greater than 0.", label(field)));
        }
        self
    }

    fn finish(self) -> Result<(), ApiError> {
        match self.first {
            None => Ok(()),
            Some(message) => Err(ApiError::Validation {
                message,
                errors: self.errors,
            }),
        }
    }
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

impl Validate for LoginData {
    fn validate(&self) -> Result<(), ApiError> {
        let mut checks = Checks::default();
        checks
            .required("email", &self.email)
            .required("password", &self.password);
        checks.finish()
    }
}

impl Validate for RegisterData {
    fn validate(&self) -> Result<(), ApiError> {
        let mut checks = Checks::default();
        for (field, value) in [
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            checks.required(field, value).max_len(field, value, MAX_TEXT);
        }
        if !self.email.trim().is_empty() && !looks_like_email(&self.email) {
            checks.fail("email", "The email field must be a valid email address.".into());
        }
        if self.password != self.password_confirmation {
            checks.fail(
                "password_confirmation",
                "The password confirmation does not match.".into(),
            );
        }
        checks.finish()
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

impl Validate for NewListing {
    fn validate(&self) -> Result<(), ApiError> {
        let mut checks = Checks::default();
        checks
            .positive("price", self.price)
            .required("description", &self.description);
        if self.vehicle <= 0 {
            checks.fail("vehicle", "The vehicle field is required.".into());
        }
        checks.finish()
    }
}

impl Validate for EditListing {
    fn validate(&self) -> Result<(), ApiError> {
        let mut checks = Checks::default();
        checks
            .positive("price", self.price)
            .required("description", &self.description);
        checks.finish()
    }
}

impl Validate for SellData {
    fn validate(&self) -> Result<(), ApiError> {
        let mut checks = Checks::default();
        if self.buyer <= 0 {
            checks.fail("buyer", "The buyer field is required.".into());
        }
        checks.finish()
    }
}

impl Validate for NewVehicleData {
    fn validate(&self) -> Result<(), ApiError> {
        let mut checks = Checks::default();
        checks
            .required("make", &self.make)
            .required("model", &self.model)
            .required("description", &self.description);
        if self.year < 1 {
            checks.fail("year", "The year field must be at least 1.".into());
        }
        checks.finish()
    }
}

impl Validate for EditVehicleData {
    fn validate(&self) -> Result<(), ApiError> {
        self.fields.validate()
    }
}

impl Validate for NewPostData {
    fn validate(&self) -> Result<(), ApiError> {
        let mut checks = Checks::default();
        checks
            .required("title", &self.title)
            .required("content", &self.content);
        checks.finish()
    }
}

impl Validate for NewCommentData {
    fn validate(&self) -> Result<(), ApiError> {
        let mut checks = Checks::default();
        checks.required("content", &self.content);
        checks.finish()
    }
}

impl Validate for NewEventData {
    fn validate(&self) -> Result<(), ApiError> {
        let mut checks = Checks::default();
        checks
            .required("title", &self.title)
            .max_len("title", &self.title, MAX_TEXT)
            .required("description", &self.description)
            .required("location", &self.location)
            .max_len("location", &self.location, MAX_LOCATION);

        let start = parse_event_date(&self.start_date);
        let end = parse_event_date(&self.end_date);
        if start.is_none() {
            checks.fail("start_date", "The start date field must be a valid date.".into());
        }
        if end.is_none() {
            checks.fail("end_date", "The end date field must be a valid date.".into());
        }
        if let (Some(start), Some(end)) = (start, end)
            && end < start
        {
            checks.fail(
                "end_date",
                "The end date field must be a date after or equal to start date.".into(),
            );
        }
        checks.finish()
    }
}
