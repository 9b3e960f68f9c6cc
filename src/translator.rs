//! Free-text request to [`StructuredQuery`] translation.
//!
//! The text generator is an untyped `prompt -> text` black box, so every
//! answer is searched for a bracketed span and read token by token. A
//! malformed answer drops only the field it was asked for; the failure is
//! reported in [`Translation::failures`] and logged, never raised.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::error::{GenerationError, ParseFailure};
use crate::models::{CalendarDate, Coordinates, StructuredQuery};

// Greedy: first '[' through last ']' once line breaks are gone
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*\]").expect("bracket pattern is valid"));

// A word of two or more characters, or a two-word phrase
static TAG_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+ *\w+").expect("tag pattern is valid"));

static COORDINATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([-+]?\d*\.?\d+)[\s°(]*(?:(?i:([NSEW])(?:orth|outh|ast|est)?)\b)?")
        .expect("coordinate pattern is valid")
});

static INTEGER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("integer pattern is valid"));

/// Single-shot text generation, no conversation state between calls.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryField {
    Tags,
    Location,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationFailure {
    pub field: QueryField,
    pub reason: ParseFailure,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    pub query: StructuredQuery,
    pub failures: Vec<TranslationFailure>,
}

impl Translation {
    pub fn failed(&self, field: QueryField) -> bool {
        self.failures.iter().any(|failure| failure.field == field)
    }
}

pub fn tags_prompt(request: &str, vocabulary: &BTreeSet<String>) -> String {
    let valid_tags = vocabulary
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Return a list of tags (objects or people) likely to appear in an image described by the following input. \
         Return your answer as a list surrounded by square brackets.\n\
         Only use tags from this list: {}.\n\
         The input is: {}",
        valid_tags, request
    )
}

pub fn location_prompt(request: &str) -> String {
    format!(
        "Return approximate latitude and longitude coordinates where an image described by the input below might have been taken. \
         The coordinates don't have to be exact but should be reasonably close to the location specified. \
         Return the coordinates formatted like so: [Latitude (° N), Longitude (° E)].\n\
         The input is: {}",
        request
    )
}

pub fn date_prompt(request: &str, today: NaiveDate) -> String {
    format!(
        "Return a likely date an image described by the input below might have been taken. \
         Return the date in the form [YYYY:MM:DD] surrounded by square brackets. \
         The current date is {}.\n\
         The input is: {}",
        today.format("%Y-%m-%d"),
        request
    )
}

fn bracketed_span(response: &str) -> Result<String, ParseFailure> {
    let joined = response.replace(['\r', '\n'], "");
    BRACKETED
        .find(&joined)
        .map(|span| span.as_str().to_string())
        .ok_or(ParseFailure::MissingBrackets)
}

/// Reads the tag list. Duplicates and out-of-vocabulary tags are kept.
pub fn parse_tags(response: &str) -> Result<Vec<String>, ParseFailure> {
    let span = bracketed_span(&response.to_lowercase())?;
    Ok(TAG_TOKEN
        .find_iter(&span)
        .map(|token| token.as_str().to_string())
        .collect())
}

/// Reads a `[lat, lon]` pair. A value followed by an `S` or `W` hemisphere
/// letter is made negative.
pub fn parse_location_response(response: &str) -> Result<Coordinates, ParseFailure> {
    let span = bracketed_span(response)?;
    let tokens: Vec<_> = COORDINATE_TOKEN.captures_iter(&span).collect();
    if tokens.len() != 2 {
        return Err(ParseFailure::WrongValueCount {
            expected: 2,
            found: tokens.len(),
        });
    }

    let values = tokens
        .iter()
        .map(|caps| {
            let number = &caps[1];
            let value: f64 = number
                .parse()
                .map_err(|_| ParseFailure::InvalidNumber(number.to_string()))?;
            let hemisphere = caps
                .get(2)
                .map(|letter| letter.as_str().to_ascii_uppercase());
            Ok(match hemisphere.as_deref() {
                Some("S") | Some("W") => -value.abs(),
                _ => value,
            })
        })
        .collect::<Result<Vec<f64>, ParseFailure>>()?;

    Ok(Coordinates {
        latitude: values[0],
        longitude: values[1],
    })
}

/// Reads a `[YYYY:MM:DD]` date.
pub fn parse_date_response(response: &str) -> Result<CalendarDate, ParseFailure> {
    let span = bracketed_span(response)?;
    let tokens: Vec<&str> = INTEGER_TOKEN
        .find_iter(&span)
        .map(|token| token.as_str())
        .collect();

    let values = tokens
        .iter()
        .map(|token| {
            token
                .parse::<i32>()
                .map_err(|_| ParseFailure::InvalidNumber(token.to_string()))
        })
        .collect::<Result<Vec<i32>, ParseFailure>>();

    match (tokens.len(), values) {
        (3, Ok(values)) => Ok(CalendarDate {
            year: values[0],
            month: values[1],
            day: values[2],
        }),
        (3, Err(reason)) => Err(reason),
        (found, _) => Err(ParseFailure::WrongValueCount { expected: 3, found }),
    }
}

pub struct RequestTranslator<G> {
    generator: G,
    today: Option<NaiveDate>,
}

impl<G: TextGenerator> RequestTranslator<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            today: None,
        }
    }

    /// Pins the date given to the generator as "today".
    pub fn with_today(generator: G, today: NaiveDate) -> Self {
        Self {
            generator,
            today: Some(today),
        }
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    fn ask(&self, prompt: &str) -> Result<String, GenerationError> {
        log::debug!("Generator prompt: {}", prompt);
        let response = self.generator.generate(prompt)?;
        log::debug!("Generator response: {}", response);
        Ok(response)
    }

    /// Translates `request` using one generator call for tags, plus one each
    /// for location and date when `use_metadata` is set.
    ///
    /// Only an unavailable generator is an error.
    pub fn process_input(
        &self,
        request: &str,
        vocabulary: &BTreeSet<String>,
        use_metadata: bool,
    ) -> Result<Translation, GenerationError> {
        let request = request.trim();
        let mut translation = Translation::default();

        let response = self.ask(&tags_prompt(request, vocabulary))?;
        match parse_tags(&response) {
            Ok(tags) => {
                log::info!("Requested tags: {:?}", tags);
                translation.query.tags = tags;
            }
            Err(reason) => {
                log::warn!("No tags were generated for this request: {}", reason);
                translation.failures.push(TranslationFailure {
                    field: QueryField::Tags,
                    reason,
                });
            }
        }

        if !use_metadata {
            return Ok(translation);
        }

        let response = self.ask(&location_prompt(request))?;
        match parse_location_response(&response) {
            Ok(location) => {
                log::info!(
                    "Predicted location: {}, {}",
                    location.latitude,
                    location.longitude
                );
                translation.query.location = Some(location);
            }
            Err(reason) => {
                log::warn!("Could not read the predicted location: {}", reason);
                translation.failures.push(TranslationFailure {
                    field: QueryField::Location,
                    reason,
                });
            }
        }

        let response = self.ask(&date_prompt(request, self.today()))?;
        match parse_date_response(&response) {
            Ok(date) => {
                log::info!(
                    "Predicted date: {:04}:{:02}:{:02}",
                    date.year,
                    date.month,
                    date.day
                );
                translation.query.timestamp = Some(date);
            }
            Err(reason) => {
                log::warn!("Could not read the predicted date: {}", reason);
                translation.failures.push(TranslationFailure {
                    field: QueryField::Timestamp,
                    reason,
                });
            }
        }

        Ok(translation)
    }
}
