// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Structural validation of the model's JSON report.
//!
//! Checks run in a fixed order and stop at the first failure. Beyond the
//! leaf-string coercion in [`ValidatedReport::into_report`] nothing is
//! repaired.

use crate::report::{SummaryReport, SummarySection};
use serde_json::{Map, Value};
use thiserror::Error;

/// Top-level fields every report must carry, in check order
pub const REQUIRED_FIELDS: [&str; 5] = [
    "executive_summary",
    "key_points",
    "sections",
    "conclusions",
    "recommendations",
];

/// Fields every section object must carry
pub const SECTION_FIELDS: [&str; 3] = ["title", "content", "points"];

pub const MIN_KEY_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Response must be a JSON object")]
    NotAnObject,

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Field 'key_points' must contain at least {min} items, got {actual}")]
    TooFewKeyPoints { min: usize, actual: usize },

    #[error("sections[{index}] must be an object")]
    SectionNotObject { index: usize },

    #[error("sections[{index}] is missing field '{field}'")]
    SectionMissingField { index: usize, field: &'static str },

    #[error("sections[{index}].points must be an array")]
    SectionPointsNotArray { index: usize },
}

/// Borrowed view of a response that passed every check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReport<'a> {
    executive_summary: &'a str,
    key_points: &'a [Value],
    sections: Vec<ValidatedSection<'a>>,
    conclusions: &'a str,
    recommendations: &'a [Value],
}

#[derive(Debug, Clone, PartialEq)]
struct ValidatedSection<'a> {
    title: &'a Value,
    content: &'a Value,
    points: &'a [Value],
}

pub fn validate(value: &Value) -> Result<ValidatedReport<'_>, ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(ValidationError::MissingField(field));
        }
    }

    let executive_summary = string_field(object, "executive_summary")?;

    let key_points = array_field(object, "key_points")?;
    if key_points.len() < MIN_KEY_POINTS {
        return Err(ValidationError::TooFewKeyPoints {
            min: MIN_KEY_POINTS,
            actual: key_points.len(),
        });
    }

    let sections = array_field(object, "sections")?
        .iter()
        .enumerate()
        .map(|(index, section)| validate_section(index, section))
        .collect::<Result<Vec<_>, _>>()?;

    let conclusions = string_field(object, "conclusions")?;
    let recommendations = array_field(object, "recommendations")?;

    Ok(ValidatedReport {
        executive_summary,
        key_points,
        sections,
        conclusions,
        recommendations,
    })
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ValidationError::WrongType {
            field,
            expected: "a string",
        })
}

fn array_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a [Value], ValidationError> {
    object
        .get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or(ValidationError::WrongType {
            field,
            expected: "an array",
        })
}

fn validate_section(index: usize, section: &Value) -> Result<ValidatedSection<'_>, ValidationError> {
    let object = section
        .as_object()
        .ok_or(ValidationError::SectionNotObject { index })?;

    for field in SECTION_FIELDS {
        if !object.contains_key(field) {
            return Err(ValidationError::SectionMissingField { index, field });
        }
    }

    let points = object
        .get("points")
        .and_then(Value::as_array)
        .ok_or(ValidationError::SectionPointsNotArray { index })?;

    Ok(ValidatedSection {
        title: &object["title"],
        content: &object["content"],
        points,
    })
}

/// Render any JSON value as a string leaf.
///
/// Strings are taken verbatim; everything else becomes its compact JSON text.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_all(values: &[Value]) -> Vec<String> {
    values.iter().map(coerce_to_string).collect()
}

impl ValidatedReport<'_> {
    /// Normalize every leaf to a string and build the final report
    pub fn into_report(self) -> SummaryReport {
        SummaryReport {
            executive_summary: self.executive_summary.to_string(),
            key_points: coerce_all(self.key_points),
            sections: self
                .sections
                .into_iter()
                .map(|section| SummarySection {
                    title: coerce_to_string(section.title),
                    content: coerce_to_string(section.content),
                    points: coerce_all(section.points),
                })
                .collect(),
            conclusions: self.conclusions.to_string(),
            recommendations: coerce_all(self.recommendations),
        }
    }
}
