use humantime::Duration as HumanDuration;
use std::time::Duration;

pub trait Validatable {
    fn validate(&self) -> Result<(), String>;
}

/// Field checks shared by the dashboard configs. `owner` names the section
/// in messages, e.g. `'config'` or `chart 'cpu'`.
pub struct Validator;

impl Validator {
    /// Runs every element's validation and joins all failures, so one bad
    /// chart does not hide the next one.
    pub fn aggregate(elements: &[impl Validatable]) -> Result<(), String> {
        let errors = elements
            .iter()
            .map(|elem| elem.validate())
            .filter_map(Result::err)
            .collect::<Vec<String>>();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }

    /// Humantime duration, zero is rejected when `positive` is set.
    pub fn duration(
        field: &str,
        owner: &str,
        value: &str,
        positive: bool,
    ) -> Result<Duration, String> {
        let msg = match value.parse::<HumanDuration>() {
            Ok(interval) if positive && Duration::from(interval).is_zero() => {
                format!("field '{}' for {} must be positive", field, owner)
            }
            Ok(interval) => return Ok(interval.into()),
            Err(e) => format!("field '{}' for {} is not valid: {}", field, owner, e),
        };
        error!("{}", msg);
        Err(msg)
    }

    pub fn at_least(field: &str, owner: &str, value: u32, min: u32) -> Result<(), String> {
        if value >= min {
            return Ok(());
        }
        let msg = if min == 1 {
            format!("field '{}' for {} must be positive", field, owner)
        } else {
            format!("field '{}' for {} must be at least {}", field, owner, min)
        };
        error!("{}", msg);
        Err(msg)
    }
}
