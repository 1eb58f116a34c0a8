//! Position constraint validation for a proposed stage sequence.

use estimo_calculator::CalculatorRegistry;

use crate::error::OrderingError;

/// Check every stage's position constraints, stopping at the first violation.
///
/// Pure: no stage is executed. Codes without a registered descriptor are
/// skipped here; the executor reports them per stage.
pub fn validate_order<S: AsRef<str>>(
    registry: &CalculatorRegistry,
    sequence: &[S],
) -> Result<(), OrderingError> {
    for (position, code) in sequence.iter().enumerate() {
        let code = code.as_ref();
        let Some(descriptor) = registry.descriptor(code) else {
            continue;
        };

        if position == 0 && !descriptor.can_be_first {
            return Err(OrderingError::NotFirstEligible { code: code.to_string() });
        }

        let earlier = &sequence[..position];
        for required in &descriptor.requires_before {
            if !earlier.iter().any(|c| c.as_ref() == required) {
                return Err(OrderingError::MissingPredecessor {
                    code: code.to_string(),
                    required: required.clone(),
                    position,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CalculatorRegistry {
        CalculatorRegistry::with_built_ins()
    }

    #[test]
    fn accepts_full_chain() {
        let seq = ["dimensions", "digital_print", "lamination", "price_markup"];
        assert_eq!(validate_order(&registry(), &seq), Ok(()));
    }

    #[test]
    fn empty_sequence_is_valid() {
        let seq: [&str; 0] = [];
        assert_eq!(validate_order(&registry(), &seq), Ok(()));
    }

    #[test]
    fn rejects_ineligible_first_stage() {
        let seq = ["price_markup"];
        assert_eq!(
            validate_order(&registry(), &seq),
            Err(OrderingError::NotFirstEligible { code: "price_markup".to_string() })
        );
    }

    #[test]
    fn predecessor_must_come_earlier_not_later() {
        let seq = ["dimensions", "price_markup", "lamination"];
        assert_eq!(validate_order(&registry(), &seq), Ok(()));

        let seq = vec!["price_markup".to_string()];
        assert!(validate_order(&registry(), &seq).is_err());

        let reg = registry();
        let seq = ["dimensions", "digital_print"];
        assert!(validate_order(&reg, &seq).is_ok());
    }

    #[test]
    fn reports_missing_predecessor_position() {
        // unknown first stage is skipped, lamination still lacks dimensions before it
        let seq = ["mystery", "lamination", "dimensions"];
        assert_eq!(
            validate_order(&registry(), &seq),
            Err(OrderingError::MissingPredecessor {
                code: "lamination".to_string(),
                required: "dimensions".to_string(),
                position: 1,
            })
        );
    }
}
