use rand::Rng;

use crate::error::PlanParseError;
use crate::map::{DOOR_COUNT, Label};

/// One replayable step of an exploration walk.
///
/// `door` is `None` only for the first step, which stays in the starting room.
/// `expected_label` is what the walker saw on arrival and `next_label` is what
/// the room carries once the step's mark (if any) has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub door: Option<usize>,
    pub expected_label: Label,
    pub next_label: Label,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Door(usize),
    Mark(Label),
}

impl Trace {
    /// Compiles a plan such as `[0]3[1]5[2]` and the labels the service
    /// returned for it into steps. Every token yields one observation and the
    /// walk yields one more before the first token.
    pub fn compile(plan: &str, observed: &[Label]) -> Result<Self, PlanParseError> {
        let tokens = tokenize(plan)?;
        if observed.len() != tokens.len() + 1 {
            return Err(PlanParseError::LengthMismatch {
                expected: tokens.len() + 1,
                actual: observed.len(),
            });
        }

        let mut steps = Vec::new();
        let mut current = Step {
            door: None,
            expected_label: observed[0],
            next_label: observed[0],
        };
        for (token, &seen) in tokens.iter().zip(&observed[1..]) {
            match *token {
                Token::Door(door) => {
                    steps.push(current);
                    current = Step {
                        door: Some(door),
                        expected_label: seen,
                        next_label: seen,
                    };
                }
                Token::Mark(label) => current.next_label = label,
            }
        }
        steps.push(current);

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, depth: usize) -> Option<&Step> {
        self.steps.get(depth)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub(crate) fn tokenize(plan: &str) -> Result<Vec<Token>, PlanParseError> {
    let mut tokens = Vec::new();
    let mut chars = plan.char_indices();
    while let Some((offset, c)) = chars.next() {
        if c == '[' {
            let (label_offset, label) = chars
                .next()
                .ok_or(PlanParseError::UnclosedMark { offset })?;
            let value = label
                .to_digit(10)
                .ok_or(PlanParseError::InvalidLabel {
                    offset: label_offset,
                    found: label,
                })?;
            match chars.next() {
                Some((_, ']')) => tokens.push(Token::Mark(value as Label)),
                _ => return Err(PlanParseError::UnclosedMark { offset }),
            }
        } else {
            match c.to_digit(10) {
                Some(door) if (door as usize) < DOOR_COUNT => tokens.push(Token::Door(door as usize)),
                _ => return Err(PlanParseError::InvalidDoor { offset, found: c }),
            }
        }
    }
    Ok(tokens)
}

/// Interleaves a door route with random charcoal marks: `[0]d[c]d[c]...`.
pub fn charcoal_plan(doors: &str, rng: &mut impl Rng) -> String {
    let mut plan = "[0]".to_string();
    for door in doors.chars() {
        let mark = rng.gen_range(0..4u8);
        plan.push_str(&format!("{}[{}]", door, mark));
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_compile_marked_plan() {
        // start(2) [0]->0, door 3 -> sees 1, [2]->2, door 5 -> sees 3, [1]->1
        let trace = Trace::compile("[0]3[2]5[1]", &[2, 0, 1, 2, 3, 1]).unwrap();
        assert_eq!(
            trace.steps(),
            &[
                Step { door: None, expected_label: 2, next_label: 0 },
                Step { door: Some(3), expected_label: 1, next_label: 2 },
                Step { door: Some(5), expected_label: 3, next_label: 1 },
            ]
        );
    }

    #[test]
    fn test_unmarked_door_keeps_label() {
        let trace = Trace::compile("01", &[0, 1, 2]).unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.steps()[0], Step { door: None, expected_label: 0, next_label: 0 });
        assert_eq!(trace.steps()[2], Step { door: Some(1), expected_label: 2, next_label: 2 });
    }

    #[test]
    fn test_empty_plan_is_a_single_step() {
        let trace = Trace::compile("", &[3]).unwrap();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.get(0).unwrap().door, None);
    }

    #[test]
    fn test_rejects_bad_door() {
        let err = Trace::compile("[0]7[1]", &[0, 0, 0, 1]).unwrap_err();
        assert_eq!(err, PlanParseError::InvalidDoor { offset: 3, found: '7' });
    }

    #[test]
    fn test_rejects_bad_label() {
        let err = Trace::compile("[0]1[x]", &[0, 0, 0, 1]).unwrap_err();
        assert_eq!(err, PlanParseError::InvalidLabel { offset: 5, found: 'x' });
    }

    #[test]
    fn test_rejects_unclosed_mark() {
        assert_eq!(
            Trace::compile("1[2", &[0, 0, 0]).unwrap_err(),
            PlanParseError::UnclosedMark { offset: 1 }
        );
        assert_eq!(
            Trace::compile("1[", &[0, 0, 0]).unwrap_err(),
            PlanParseError::UnclosedMark { offset: 1 }
        );
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let err = Trace::compile("[0]1[1]", &[0, 0, 2]).unwrap_err();
        assert_eq!(err, PlanParseError::LengthMismatch { expected: 4, actual: 3 });
    }

    #[test]
    fn test_charcoal_plan_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let plan = charcoal_plan("0425", &mut rng);
        assert_eq!(plan.len(), 3 + 4 * 4);
        assert!(plan.starts_with("[0]0["));

        let observed = vec![0; 1 + 1 + 2 * 4];
        let trace = Trace::compile(&plan, &observed).unwrap();
        let doors: Vec<_> = trace.steps().iter().filter_map(|s| s.door).collect();
        assert_eq!(doors, vec![0, 4, 2, 5]);
        assert!(trace.steps().iter().all(|s| s.next_label < 4));
    }
}
