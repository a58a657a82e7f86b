// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Canonical text form of formulas
//!
//! One fixed operator set (Unicode), every binary node and quantifier
//! parenthesized. The output re-parses to a structurally identical
//! formula and is the input to cache key digests, so it must never
//! depend on anything but the formula's structure.

use crate::core::{BinaryTemporalOp, Connective, DeonticOp, Formula, Quantifier, TemporalOp};

/// Canonical serialization of a formula
pub fn serialize(formula: &Formula) -> String {
    let mut out = String::new();
    write_formula(formula, &mut out);
    out
}

fn connective_symbol(op: Connective) -> &'static str {
    match op {
        Connective::And => "∧",
        Connective::Or => "∨",
        Connective::Implies => "→",
        Connective::Iff => "↔",
        Connective::Xor => "⊕",
    }
}

fn write_formula(formula: &Formula, out: &mut String) {
    match formula {
        Formula::Binary { .. } | Formula::BinaryTemporal { .. } | Formula::Quantified { .. } => {
            out.push('(');
            write_bare(formula, out);
            out.push(')');
        }
        _ => write_bare(formula, out),
    }
}

/// Same as `write_formula` but without the outer parentheses of a
/// binary or quantified node; used where the caller already supplies them.
fn write_bare(formula: &Formula, out: &mut String) {
    match formula {
        Formula::Predicate { name, args } => {
            out.push_str(name);
            if !args.is_empty() {
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&arg.to_string());
                }
                out.push(')');
            }
        }
        Formula::Not(body) => {
            out.push('¬');
            write_formula(body, out);
        }
        Formula::Binary { op, left, right } => {
            write_formula(left, out);
            out.push(' ');
            out.push_str(connective_symbol(*op));
            out.push(' ');
            write_formula(right, out);
        }
        Formula::Quantified { quantifier, variable, body } => {
            out.push(match quantifier {
                Quantifier::Forall => '∀',
                Quantifier::Exists => '∃',
            });
            out.push_str(variable);
            out.push_str(". ");
            write_bare(body, out);
        }
        Formula::Deontic { op, body } => {
            out.push(match op {
                DeonticOp::Obligatory => 'O',
                DeonticOp::Permitted => 'P',
                DeonticOp::Forbidden => 'F',
            });
            out.push('(');
            write_bare(body, out);
            out.push(')');
        }
        Formula::Temporal { op: TemporalOp::Always, body } => {
            out.push('□');
            write_formula(body, out);
        }
        Formula::Temporal { op: TemporalOp::Eventually, body } => {
            out.push('◊');
            write_formula(body, out);
        }
        Formula::Temporal { op: TemporalOp::Next, body } => {
            out.push_str("X(");
            write_bare(body, out);
            out.push(')');
        }
        Formula::BinaryTemporal { op, left, right } => {
            write_formula(left, out);
            out.push_str(match op {
                BinaryTemporalOp::Until => " U ",
                BinaryTemporalOp::Since => " S ",
            });
            write_formula(right, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Term;
    use crate::parser::parse;

    #[test]
    fn test_canonical_forms() {
        let f = Formula::implies(Formula::atom("P"), Formula::atom("Q"));
        assert_eq!(serialize(&f), "(P → Q)");

        let g = Formula::obligatory(Formula::implies(Formula::atom("P"), Formula::atom("Q")));
        assert_eq!(serialize(&g), "O(P → Q)");

        let h = Formula::forall("x", Formula::predicate("Human", vec![Term::var("x")]));
        assert_eq!(serialize(&h), "(∀x. Human(x))");

        let n = Formula::not(Formula::always(Formula::next(Formula::atom("P"))));
        assert_eq!(serialize(&n), "¬□X(P)");
    }

    #[test]
    fn test_ascii_input_serializes_canonically() {
        let f = parse("!(a & b) -> c | d").unwrap();
        assert_eq!(serialize(&f), "(¬(a ∧ b) → (c ∨ d))");
    }

    #[test]
    fn test_round_trip_mixed_operators() {
        let texts = [
            "∀x. (Human(x) → ◊Mortal(x))",
            "O(P → Q) ∧ F(R)",
            "(A U B) S ¬C",
            "∃y. Likes(alice, f(y, bob)) ⊕ X(Z)",
            "□(O(pay) ↔ P(pay))",
        ];
        for text in texts {
            let parsed = parse(text).unwrap();
            let reparsed = parse(&serialize(&parsed)).unwrap();
            assert_eq!(parsed, reparsed, "round trip failed for {}", text);
        }
    }

    #[test]
    fn test_display_uses_canonical_form() {
        let f = Formula::and(Formula::atom("A"), Formula::atom("B"));
        assert_eq!(f.to_string(), "(A ∧ B)");
    }
}
