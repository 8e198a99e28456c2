use validator::ValidationErrors;

/// Flattens `validator` errors into a single `; `-separated message suitable
/// for the API's error envelope.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::format_validation_errors;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 3, message = "reason too short"))]
        reason: String,
    }

    #[test]
    fn joins_messages() {
        let err = Probe {
            reason: "no".into(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(format_validation_errors(&err), "reason too short");
    }
}
