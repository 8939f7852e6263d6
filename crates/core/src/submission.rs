//! Input checks for task submission, cancellation and comments.
//!
//! All of these run before anything is written, so a rejected request
//! leaves no trace in the store.

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::scheduling::validate_priority;

pub fn require_test_suite(test_suite: Option<&str>) -> Result<&str, CoreError> {
    match test_suite {
        Some(suite) if !suite.trim().is_empty() => Ok(suite),
        _ => Err(CoreError::InvalidArgument(
            "Field test_suite is required".into(),
        )),
    }
}

/// The endpoint list must be present and non-empty.
pub fn validate_endpoints(endpoints: Option<&[String]>) -> Result<&[String], CoreError> {
    match endpoints {
        None => Err(CoreError::InvalidArgument(
            "Endpoint list is not included in the request".into(),
        )),
        Some([]) => Err(CoreError::InvalidArgument("Endpoint list is empty".into())),
        Some(list) => Ok(list),
    }
}

/// Apply the default priority and range-check the result.
pub fn resolve_priority(priority: Option<i32>, default: i32) -> Result<i32, CoreError> {
    let priority = priority.unwrap_or(default);
    validate_priority(priority)?;
    Ok(priority)
}

/// Variables must be a JSON object; absent or `null` means none.
pub fn validate_variables(variables: Option<&Value>) -> Result<Map<String, Value>, CoreError> {
    match variables {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(CoreError::InvalidArgument(
            "Variables should be a dictionary".into(),
        )),
    }
}

/// Test cases must be a JSON array of strings; absent or `null` means all.
pub fn validate_test_cases(test_cases: Option<&Value>) -> Result<Vec<String>, CoreError> {
    match test_cases {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_owned).ok_or_else(|| {
                    CoreError::InvalidArgument("Test cases should be a list of names".into())
                })
            })
            .collect(),
        Some(_) => Err(CoreError::InvalidArgument(
            "Test cases should be a list".into(),
        )),
    }
}

pub fn require_comment(comment: Option<&str>) -> Result<&str, CoreError> {
    match comment {
        Some(c) if !c.is_empty() => Ok(c),
        _ => Err(CoreError::InvalidArgument("Field comment is required".into())),
    }
}

/// A cancel request must name both the endpoint address and the priority,
/// since together they identify the queue holding the task.
pub fn require_cancel_target(
    address: Option<&str>,
    priority: Option<i32>,
) -> Result<(&str, i32), CoreError> {
    let address = address
        .filter(|a| !a.is_empty())
        .ok_or_else(|| CoreError::InvalidArgument("Field address is required".into()))?;
    let priority =
        priority.ok_or_else(|| CoreError::InvalidArgument("Field priority is required".into()))?;
    Ok((address, priority))
}
