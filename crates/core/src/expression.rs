//! Arithmetic sequences shown to the player.
//!
//! A [`Sequence`] is the operand/operator chain drawn at the start of every
//! round. [`ExpressionEngine`] draws sequences whose value is never negative
//! and evaluates them with the usual precedence (`×`/`÷` before `+`/`-`).

use std::fmt;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Binary operator placed between two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Addition
    Add,
    /// Subtraction
    Subtract,
    /// Multiplication
    Multiply,
    /// Division
    Divide,
}

impl Operator {
    /// Symbol used in the displayed problem text.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "×",
            Operator::Divide => "÷",
        }
    }

    /// Whether the operator belongs to the tier resolved in the first pass.
    pub fn binds_tighter(self) -> bool {
        matches!(self, Operator::Multiply | Operator::Divide)
    }

    /// Apply the operator. Division by zero yields 0.
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
            Operator::Divide => {
                if rhs != 0.0 {
                    lhs / rhs
                } else {
                    0.0
                }
            }
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Ordered operands with the operators between them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sequence {
    operands: Vec<u32>,
    operators: Vec<Operator>,
}

impl Sequence {
    /// Build a sequence, checking there is exactly one operator between each
    /// pair of operands.
    pub fn new(operands: Vec<u32>, operators: Vec<Operator>) -> Result<Self> {
        let expected = operands.len().saturating_sub(1);
        if operators.len() != expected {
            return Err(CoreError::InvalidSequence {
                operands: operands.len(),
                operators: operators.len(),
            });
        }
        Ok(Self { operands, operators })
    }

    /// Operand values in display order.
    pub fn operands(&self) -> &[u32] {
        &self.operands
    }

    /// Operators, `operators()[i]` sits between operand `i` and `i + 1`.
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// Number of operands.
    pub fn len(&self) -> usize {
        self.operands.len()
    }

    /// True when the sequence has no operands.
    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }
}

/// Draws and evaluates sequences.
#[derive(Debug, Clone)]
pub struct ExpressionEngine {
    operand_range: RangeInclusive<u32>,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self {
            operand_range: 1..=9,
        }
    }
}

impl ExpressionEngine {
    /// Create an engine drawing operands from `operand_range`.
    ///
    /// The range must be non-empty and start at 1 or above, otherwise a
    /// non-negative sequence is not guaranteed to exist.
    pub fn new(operand_range: RangeInclusive<u32>) -> Result<Self> {
        if operand_range.is_empty() || *operand_range.start() == 0 {
            return Err(CoreError::InvalidOperandRange {
                min: *operand_range.start(),
                max: *operand_range.end(),
            });
        }
        Ok(Self { operand_range })
    }

    /// Operand range used by [`ExpressionEngine::generate`].
    pub fn operand_range(&self) -> &RangeInclusive<u32> {
        &self.operand_range
    }

    /// Draw a sequence of `length` operands whose value is non-negative.
    ///
    /// Rejected draws are thrown away whole and redrawn with no retry cap.
    /// Termination relies on operands being at least 1: an all-addition
    /// chain is always reachable.
    pub fn generate<R: Rng>(&self, length: usize, rng: &mut R) -> Sequence {
        loop {
            let operands: Vec<u32> = (0..length)
                .map(|_| rng.random_range(self.operand_range.clone()))
                .collect();
            let operators = draw_operators(&operands, rng);
            let sequence = Sequence { operands, operators };
            if Self::evaluate(&sequence) >= 0.0 {
                return sequence;
            }
        }
    }

    /// Evaluate with precedence.
    ///
    /// Pass one collapses every `×`/`÷` pair in place, left to right, and
    /// rescans from the same position after each collapse. Pass two folds the
    /// remaining `+`/`-` left to right.
    pub fn evaluate(sequence: &Sequence) -> f64 {
        let Some(&first) = sequence.operands.first() else {
            return 0.0;
        };
        if sequence.operands.len() == 1 {
            return f64::from(first);
        }

        let mut values: Vec<f64> = sequence.operands.iter().map(|&n| f64::from(n)).collect();
        let mut ops = sequence.operators.clone();

        let mut i = 0;
        while i < ops.len() {
            if ops[i].binds_tighter() {
                values[i] = ops[i].apply(values[i], values[i + 1]);
                values.remove(i + 1);
                ops.remove(i);
            } else {
                i += 1;
            }
        }

        let mut result = values[0];
        for (op, value) in ops.iter().zip(&values[1..]) {
            result = op.apply(result, *value);
        }
        result
    }

    /// Render the problem text, e.g. `"4 + 2 × 3 = ?"`.
    pub fn format(sequence: &Sequence) -> String {
        let Some(first) = sequence.operands.first() else {
            return String::new();
        };
        let mut problem = first.to_string();
        for (op, operand) in sequence.operators.iter().zip(&sequence.operands[1..]) {
            problem.push_str(&format!(" {} {}", op, operand));
        }
        problem.push_str(" = ?");
        problem
    }
}

/// Pick one operator per adjacent pair.
///
/// Division is kept only when the running left-to-right value divides evenly
/// by the next operand; a rejected division becomes addition, not a re-roll.
fn draw_operators<R: Rng>(operands: &[u32], rng: &mut R) -> Vec<Operator> {
    let Some(&first) = operands.first() else {
        return Vec::new();
    };

    let mut running = f64::from(first);
    let mut operators = Vec::with_capacity(operands.len().saturating_sub(1));
    for &operand in &operands[1..] {
        let num = f64::from(operand);
        let op = match rng.random_range(0..4u8) {
            2 if num != 0.0 && running % num == 0.0 => Operator::Divide,
            1 => Operator::Multiply,
            3 => Operator::Subtract,
            _ => Operator::Add,
        };
        running = op.apply(running, num);
        operators.push(op);
    }
    operators
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seq(operands: &[u32], operators: &[Operator]) -> Sequence {
        Sequence::new(operands.to_vec(), operators.to_vec()).unwrap()
    }

    #[test]
    fn test_multiplication_binds_before_addition() {
        let s = seq(&[2, 3, 2], &[Operator::Add, Operator::Multiply]);
        assert_eq!(ExpressionEngine::evaluate(&s), 8.0);
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        let s = seq(&[5, 0], &[Operator::Divide]);
        assert_eq!(ExpressionEngine::evaluate(&s), 0.0);
    }

    #[test]
    fn test_division_by_zero_inside_chain_continues() {
        // 1 + 9 ÷ 0 × 4 - 2  =>  1 + 0 - 2
        let s = seq(
            &[1, 9, 0, 4, 2],
            &[Operator::Add, Operator::Divide, Operator::Multiply, Operator::Subtract],
        );
        assert_eq!(ExpressionEngine::evaluate(&s), -1.0);
    }

    #[test]
    fn test_same_tier_resolves_left_to_right() {
        // 8 ÷ 4 × 2 = 4, not 1
        let s = seq(&[8, 4, 2], &[Operator::Divide, Operator::Multiply]);
        assert_eq!(ExpressionEngine::evaluate(&s), 4.0);

        // 9 - 3 + 2 = 8, not 4
        let s = seq(&[9, 3, 2], &[Operator::Subtract, Operator::Add]);
        assert_eq!(ExpressionEngine::evaluate(&s), 8.0);
    }

    #[test]
    fn test_scenario_expression() {
        let s = seq(&[4, 2, 3], &[Operator::Add, Operator::Multiply]);
        assert_eq!(ExpressionEngine::evaluate(&s), 10.0);
        assert_eq!(ExpressionEngine::format(&s), "4 + 2 × 3 = ?");
    }

    #[test]
    fn test_evaluate_short_sequences() {
        assert_eq!(ExpressionEngine::evaluate(&Sequence::default()), 0.0);
        assert_eq!(ExpressionEngine::evaluate(&seq(&[7], &[])), 7.0);
        assert_eq!(ExpressionEngine::format(&seq(&[7], &[])), "7 = ?");
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let s = seq(&[2, 6, 4], &[Operator::Add, Operator::Divide]);
        let first = ExpressionEngine::evaluate(&s);
        assert_eq!(first, 3.5);
        assert_eq!(first.to_bits(), ExpressionEngine::evaluate(&s).to_bits());
    }

    #[test]
    fn test_format_uses_every_symbol() {
        let s = seq(
            &[6, 3, 2, 1, 5],
            &[Operator::Divide, Operator::Multiply, Operator::Subtract, Operator::Add],
        );
        assert_eq!(ExpressionEngine::format(&s), "6 ÷ 3 × 2 - 1 + 5 = ?");
    }

    #[test]
    fn test_sequence_rejects_mismatched_operators() {
        let err = Sequence::new(vec![1, 2, 3], vec![Operator::Add]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidSequence { operands: 3, operators: 1 }
        ));
        assert!(Sequence::new(vec![], vec![]).is_ok());
    }

    #[test]
    fn test_engine_rejects_zero_or_empty_range() {
        assert!(ExpressionEngine::new(0..=9).is_err());
        let (lo, hi) = (5, 4);
        assert!(ExpressionEngine::new(lo..=hi).is_err());
        assert!(ExpressionEngine::new(1..=9).is_ok());
    }

    #[test]
    fn test_generated_sequences_are_non_negative() {
        let engine = ExpressionEngine::default();
        let mut rng = StdRng::seed_from_u64(7);
        for length in 1..=8 {
            for _ in 0..200 {
                let s = engine.generate(length, &mut rng);
                assert_eq!(s.len(), length);
                assert_eq!(s.operators().len(), length - 1);
                assert!(s.operands().iter().all(|n| (1..=9).contains(n)));
                assert!(ExpressionEngine::evaluate(&s) >= 0.0);
            }
        }
    }

    #[test]
    fn test_generated_division_divides_running_value() {
        let engine = ExpressionEngine::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let s = engine.generate(5, &mut rng);
            let mut running = f64::from(s.operands()[0]);
            for (op, &n) in s.operators().iter().zip(&s.operands()[1..]) {
                if *op == Operator::Divide {
                    assert_eq!(running % f64::from(n), 0.0);
                }
                running = op.apply(running, f64::from(n));
            }
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let engine = ExpressionEngine::default();
        let a = engine.generate(6, &mut StdRng::seed_from_u64(3));
        let b = engine.generate(6, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
